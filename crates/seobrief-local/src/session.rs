//! One user's research session: the pipeline plus the current wizard state.

use crate::pipeline::ResearchPipeline;
use seobrief_core::wizard::{ContentInputs, GenerationRequest, WizardState, WizardStep};
use seobrief_core::{AnalysisBundle, Result};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct Session {
    pipeline: ResearchPipeline,
    state: WizardState,
}

impl Session {
    pub fn new(pipeline: ResearchPipeline) -> Self {
        Self {
            pipeline,
            state: WizardState::default(),
        }
    }

    pub fn pipeline(&self) -> &ResearchPipeline {
        &self.pipeline
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn bundle(&self) -> Option<&AnalysisBundle> {
        self.state.bundle()
    }

    /// Starts over for `keyword`. The previous bundle is dropped before the run,
    /// so a failed submission leaves the session empty rather than stale.
    pub async fn submit(&mut self, keyword: &str) -> Result<WizardStep> {
        self.submit_with_cancel(keyword, &CancellationToken::new())
            .await
    }

    pub async fn submit_with_cancel(
        &mut self,
        keyword: &str,
        cancel: &CancellationToken,
    ) -> Result<WizardStep> {
        self.state = WizardState::default();
        let bundle = self.pipeline.run_with_cancel(keyword, cancel).await?;
        self.state = WizardState::researched(bundle);
        Ok(self.state.step())
    }

    pub fn reset(&mut self) {
        self.state = WizardState::default();
    }

    pub fn set_inputs(&mut self, inputs: ContentInputs) -> Result<WizardStep> {
        self.state = self.state.with_inputs(inputs)?;
        Ok(self.state.step())
    }

    pub fn choose_outline(&mut self, outline_id: u8) -> Result<WizardStep> {
        self.state = self.state.with_outline(outline_id)?;
        Ok(self.state.step())
    }

    pub fn generation_request(&self) -> Option<GenerationRequest> {
        self.state.generation_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResearchConfig;
    use seobrief_core::wizard::Tone;

    fn session() -> Session {
        Session::new(ResearchPipeline::demo(ResearchConfig::default()))
    }

    #[tokio::test]
    async fn new_keyword_discards_previous_state() {
        let mut s = session();
        s.submit("first").await.unwrap();
        s.set_inputs(ContentInputs::new("Title", "", Tone::Casual, 800).unwrap())
            .unwrap();
        s.choose_outline(1).unwrap();
        assert_eq!(s.step(), WizardStep::Draft);

        assert_eq!(s.submit("second").await.unwrap(), WizardStep::Inputs);
        assert_eq!(s.bundle().unwrap().keyword, "second");
        assert!(s.generation_request().is_none());
    }

    #[tokio::test]
    async fn failed_submission_leaves_session_empty() {
        let mut s = session();
        s.submit("first").await.unwrap();
        assert!(s.submit("  ").await.is_err());
        assert_eq!(s.step(), WizardStep::Research);
        assert!(s.bundle().is_none());
    }

    #[tokio::test]
    async fn full_walk_produces_generation_request() {
        let mut s = session();
        assert!(s
            .set_inputs(ContentInputs::new("T", "", Tone::Casual, 800).unwrap())
            .is_err());
        s.submit("marketing digital").await.unwrap();
        s.set_inputs(
            ContentInputs::new("Marketing guide", "seo, ads", Tone::Educational, 2500).unwrap(),
        )
        .unwrap();
        assert_eq!(s.choose_outline(3).unwrap(), WizardStep::Draft);
        let req = s.generation_request().unwrap();
        assert_eq!(req.outline_name, "Comparative");
        assert_eq!(req.competitor_references.len(), 3);
        assert!(req.strategy.is_some());

        s.reset();
        assert_eq!(s.step(), WizardStep::Research);
    }
}
