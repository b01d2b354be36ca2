use dotgrid::PositionRenderer;

/// Renders both dots as a log line per turn.
pub struct LogRenderer;

impl PositionRenderer for LogRenderer {
    fn render(&mut self, local: (i32, i32), remote: (i32, i32)) {
        log::info!(
            "local dot at ({}, {}), remote dot at ({}, {})",
            local.0,
            local.1,
            remote.0,
            remote.1
        );
    }
}
