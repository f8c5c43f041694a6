//! Per-surface renderers built from a display configuration

use super::error::ModuleError;
use super::modules::{mspt_tier, tps_tier};
use super::pipeline::{ModulePipeline, RenderFn};
use super::telemetry::Telemetry;
use std::sync::Arc;
use tickhud_core::{UserHandle, MAX_TPS, MSPT_BUDGET};
use tickhud_types::{
    BarColors, BarOverlay, DisplayConfig, FillMode, SurfaceFrame, SurfaceKind, Theme, Tier,
};

/// Snapshot of everything one slot needs to render a frame
pub enum SurfaceRenderer {
    Tab {
        header: Option<ModulePipeline>,
        footer: Option<ModulePipeline>,
    },
    ActionBar {
        pipeline: ModulePipeline,
    },
    BossBar {
        pipeline: ModulePipeline,
        fill_mode: FillMode,
        overlay: BarOverlay,
        colors: BarColors,
    },
}

fn pipeline(
    modules: &str,
    separator: &str,
    user: &Arc<dyn UserHandle>,
    theme: &Arc<Theme>,
    render_fn: &RenderFn,
) -> Result<ModulePipeline, ModuleError> {
    Ok(ModulePipeline::builder()
        .modules(modules)?
        .user(Arc::clone(user))
        .theme(Arc::clone(theme))
        .separator(separator)
        .render_fn(Arc::clone(render_fn))
        .build())
}

impl SurfaceRenderer {
    pub fn build(
        kind: SurfaceKind,
        config: &DisplayConfig,
        user: &Arc<dyn UserHandle>,
        theme: &Arc<Theme>,
        render_fn: &RenderFn,
    ) -> Result<Self, ModuleError> {
        let separator = config.surface(kind).separator.as_str();
        Ok(match kind {
            SurfaceKind::Tab => {
                let header = pipeline(&config.tab.header_modules, separator, user, theme, render_fn)?;
                let footer = pipeline(&config.tab.footer_modules, separator, user, theme, render_fn)?;
                SurfaceRenderer::Tab {
                    header: (header.module_count() > 0).then_some(header),
                    footer: (footer.module_count() > 0).then_some(footer),
                }
            }
            SurfaceKind::ActionBar => SurfaceRenderer::ActionBar {
                pipeline: pipeline(&config.action_bar.modules, separator, user, theme, render_fn)?,
            },
            SurfaceKind::BossBar => SurfaceRenderer::BossBar {
                pipeline: pipeline(&config.boss_bar.modules, separator, user, theme, render_fn)?,
                fill_mode: config.boss_bar.fill_mode,
                overlay: config.boss_bar.overlay,
                colors: config.boss_bar.colors,
            },
        })
    }

    pub fn kind(&self) -> SurfaceKind {
        match self {
            SurfaceRenderer::Tab { .. } => SurfaceKind::Tab,
            SurfaceRenderer::ActionBar { .. } => SurfaceKind::ActionBar,
            SurfaceRenderer::BossBar { .. } => SurfaceKind::BossBar,
        }
    }

    pub fn render(&self, telemetry: &Telemetry) -> SurfaceFrame {
        match self {
            SurfaceRenderer::Tab { header, footer } => SurfaceFrame::Tab {
                header: header.as_ref().map(|p| p.render(telemetry)),
                footer: footer.as_ref().map(|p| p.render(telemetry)),
            },
            SurfaceRenderer::ActionBar { pipeline } => SurfaceFrame::ActionBar {
                text: pipeline.render(telemetry),
            },
            SurfaceRenderer::BossBar {
                pipeline,
                fill_mode,
                overlay,
                colors,
            } => {
                let tps = telemetry.recent_tps().first().copied().unwrap_or(MAX_TPS);
                let mspt = telemetry.average_mspt();
                SurfaceFrame::BossBar {
                    text: pipeline.render(telemetry),
                    progress: bar_progress(*fill_mode, tps, mspt),
                    color: colors.for_tier(bar_tier(*fill_mode, tps, mspt)),
                    overlay: *overlay,
                }
            }
        }
    }
}

/// Boss bar fill fraction for a fill mode, clamped to `[0, 1]`
pub fn bar_progress(mode: FillMode, tps: f64, mspt: f64) -> f32 {
    let progress = match mode {
        FillMode::Tps => tps / MAX_TPS,
        FillMode::Mspt => mspt / MSPT_BUDGET,
        FillMode::ReverseTps => 1.0 - tps / MAX_TPS,
        FillMode::ReverseMspt => 1.0 - mspt / MSPT_BUDGET,
    };
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0) as f32
}

/// Tier of the metric that drives the bar
pub fn bar_tier(mode: FillMode, tps: f64, mspt: f64) -> Tier {
    match mode {
        FillMode::Tps | FillMode::ReverseTps => tps_tier(tps),
        FillMode::Mspt | FillMode::ReverseMspt => mspt_tier(mspt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::standard_render;
    use crate::core::testing::{telemetry_with, FakeUser};
    use tickhud_types::BarColor;

    fn build(kind: SurfaceKind, config: &DisplayConfig) -> SurfaceRenderer {
        let user: Arc<dyn UserHandle> = FakeUser::new();
        SurfaceRenderer::build(kind, config, &user, &Arc::new(Theme::default()), &standard_render()).unwrap()
    }

    #[test]
    fn test_bar_progress_modes() {
        assert_eq!(bar_progress(FillMode::Tps, 20.0, 0.0), 1.0);
        assert_eq!(bar_progress(FillMode::Tps, 10.0, 0.0), 0.5);
        assert_eq!(bar_progress(FillMode::Mspt, 20.0, 25.0), 0.5);
        assert_eq!(bar_progress(FillMode::Mspt, 20.0, 120.0), 1.0);
        assert_eq!(bar_progress(FillMode::ReverseTps, 15.0, 0.0), 0.25);
        assert_eq!(bar_progress(FillMode::ReverseMspt, 20.0, 10.0), 0.8);
        assert_eq!(bar_progress(FillMode::ReverseMspt, 20.0, 80.0), 0.0);
        assert_eq!(bar_progress(FillMode::Tps, f64::NAN, 0.0), 0.0);
    }

    #[test]
    fn test_tab_sides_without_modules_are_left_alone() {
        let config = DisplayConfig::default();
        let telemetry = telemetry_with(vec![20.0; 4], 5.0);
        let frame = build(SurfaceKind::Tab, &config).render(&telemetry);
        assert_eq!(
            frame,
            SurfaceFrame::Tab {
                header: None,
                footer: Some("TPS: 20.00 MSPT: 5.00".to_string()),
            }
        );
    }

    #[test]
    fn test_boss_bar_frame() {
        let mut config = DisplayConfig::default();
        config.boss_bar.modules = "mspt".to_string();
        config.boss_bar.fill_mode = FillMode::Mspt;
        let telemetry = telemetry_with(vec![20.0; 4], 30.0);

        let renderer = build(SurfaceKind::BossBar, &config);
        assert_eq!(renderer.kind(), SurfaceKind::BossBar);
        match renderer.render(&telemetry) {
            SurfaceFrame::BossBar {
                text,
                progress,
                color,
                overlay,
            } => {
                assert_eq!(text, "MSPT: 30.00");
                assert_eq!(progress, 0.6);
                assert_eq!(color, BarColor::Yellow);
                assert_eq!(overlay, BarOverlay::Notched20);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }
}
