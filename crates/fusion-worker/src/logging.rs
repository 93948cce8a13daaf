//! Structured stage logging.
//!
//! Every stage of a channel run logs through a [`StageLogger`] so events
//! carry the same `channel` and `stage` fields.

use tracing::{error, info, warn, Span};

#[derive(Debug, Clone)]
pub struct StageLogger {
    channel: String,
    stage: String,
}

impl StageLogger {
    pub fn new(channel: &str, stage: &str) -> Self {
        Self {
            channel: channel.to_string(),
            stage: stage.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(channel = %self.channel, stage = %self.stage, "Stage started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(channel = %self.channel, stage = %self.stage, "Stage progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(channel = %self.channel, stage = %self.stage, "Stage warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(channel = %self.channel, stage = %self.stage, "Stage error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(channel = %self.channel, stage = %self.stage, "Stage completed: {}", message);
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Logger for another stage of the same channel.
    pub fn for_stage(&self, stage: &str) -> Self {
        Self::new(&self.channel, stage)
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("stage", channel = %self.channel, stage = %self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_logger_fields() {
        let logger = StageLogger::new("wildfusion", "cut");
        assert_eq!(logger.channel(), "wildfusion");
        assert_eq!(logger.stage(), "cut");

        let next = logger.for_stage("post_process");
        assert_eq!(next.channel(), "wildfusion");
        assert_eq!(next.stage(), "post_process");
    }
}
