//! Article wizard state: research -> inputs -> structure -> draft.
//!
//! Each transition returns a fresh state; the previous one is left untouched.

use crate::{AnalysisBundle, ContentStrategy, Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Technical,
    Educational,
}

impl std::str::FromStr for Tone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            "technical" => Ok(Tone::Technical),
            "educational" => Ok(Tone::Educational),
            other => Err(Error::InvalidInput(format!(
                "unknown tone {other:?} (allowed: professional, casual, technical, educational)"
            ))),
        }
    }
}

pub const WORD_COUNT_CHOICES: [u32; 4] = [800, 1500, 2500, 3500];
pub const DEFAULT_WORD_COUNT: u32 = 1500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentInputs {
    pub title: String,
    pub related_keywords: Vec<String>,
    pub tone: Tone,
    pub word_count: u32,
}

impl ContentInputs {
    pub fn new(title: &str, related_keywords: &str, tone: Tone, word_count: u32) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("article title must not be empty".to_string()));
        }
        if !WORD_COUNT_CHOICES.contains(&word_count) {
            return Err(Error::InvalidInput(format!(
                "word count {word_count} is not one of {WORD_COUNT_CHOICES:?}"
            )));
        }
        Ok(Self {
            title: title.to_string(),
            related_keywords: parse_related_keywords(related_keywords),
            tone,
            word_count,
        })
    }
}

/// Comma-separated list; blanks and case-insensitive duplicates are dropped.
pub fn parse_related_keywords(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let k = part.trim();
        if k.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(k)) {
            continue;
        }
        out.push(k.to_string());
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutlineOption {
    pub id: u8,
    pub name: String,
    pub headers: Vec<String>,
}

pub fn outline_options(keyword: &str) -> Vec<OutlineOption> {
    let kw = keyword.trim();
    let opt = |id: u8, name: &str, headers: [String; 7]| OutlineOption {
        id,
        name: name.to_string(),
        headers: headers.to_vec(),
    };
    vec![
        opt(
            1,
            "Educational",
            [
                format!("Introduction: what is {kw}?"),
                format!("Why {kw} matters"),
                "Step-by-step guide".to_string(),
                "Common mistakes to avoid".to_string(),
                "Recommended tools".to_string(),
                "Success stories".to_string(),
                "Conclusion and next steps".to_string(),
            ],
        ),
        opt(
            2,
            "Commercial",
            [
                format!("The problem with {kw}"),
                "The definitive solution".to_string(),
                "Proven benefits".to_string(),
                "How to get started today".to_string(),
                "Frequently asked questions".to_string(),
                "Testimonials and cases".to_string(),
                "Call to action".to_string(),
            ],
        ),
        opt(
            3,
            "Comparative",
            [
                format!("Introduction to {kw}"),
                "Traditional vs modern approach".to_string(),
                "Pros and cons".to_string(),
                "Which one fits your situation".to_string(),
                "Putting it into practice".to_string(),
                "Expected results".to_string(),
                "Final recommendation".to_string(),
            ],
        ),
    ]
}

/// Hand-off value for the (external) article generation stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub keyword: String,
    pub title: String,
    pub outline_name: String,
    pub headers: Vec<String>,
    pub tone: Tone,
    pub word_count: u32,
    pub related_keywords: Vec<String>,
    /// (title, url) of each analyzed competitor; reference only.
    pub competitor_references: Vec<(String, String)>,
    pub strategy: Option<ContentStrategy>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Research,
    Inputs,
    Structure,
    Draft,
}

#[derive(Debug, Clone, Default)]
pub enum WizardState {
    #[default]
    Research,
    Inputs {
        bundle: Box<AnalysisBundle>,
    },
    Structure {
        bundle: Box<AnalysisBundle>,
        inputs: ContentInputs,
    },
    Draft {
        bundle: Box<AnalysisBundle>,
        inputs: ContentInputs,
        outline: OutlineOption,
    },
}

impl WizardState {
    pub fn step(&self) -> WizardStep {
        match self {
            WizardState::Research => WizardStep::Research,
            WizardState::Inputs { .. } => WizardStep::Inputs,
            WizardState::Structure { .. } => WizardStep::Structure,
            WizardState::Draft { .. } => WizardStep::Draft,
        }
    }

    pub fn bundle(&self) -> Option<&AnalysisBundle> {
        match self {
            WizardState::Research => None,
            WizardState::Inputs { bundle }
            | WizardState::Structure { bundle, .. }
            | WizardState::Draft { bundle, .. } => Some(bundle),
        }
    }

    /// A finished research run always restarts the wizard; nothing carries over
    /// from a previous keyword.
    pub fn researched(bundle: AnalysisBundle) -> Self {
        WizardState::Inputs {
            bundle: Box::new(bundle),
        }
    }

    pub fn with_inputs(&self, inputs: ContentInputs) -> Result<Self> {
        let bundle = self
            .bundle()
            .ok_or_else(|| Error::InvalidInput("run competitor research first".to_string()))?;
        Ok(WizardState::Structure {
            bundle: Box::new(bundle.clone()),
            inputs,
        })
    }

    pub fn with_outline(&self, outline_id: u8) -> Result<Self> {
        let (bundle, inputs) = match self {
            WizardState::Structure { bundle, inputs } | WizardState::Draft { bundle, inputs, .. } => {
                (bundle, inputs)
            }
            _ => {
                return Err(Error::InvalidInput(
                    "content parameters must be set before choosing an outline".to_string(),
                ))
            }
        };
        let outline = outline_options(&bundle.keyword)
            .into_iter()
            .find(|o| o.id == outline_id)
            .ok_or_else(|| Error::InvalidInput(format!("unknown outline id {outline_id}")))?;
        Ok(WizardState::Draft {
            bundle: bundle.clone(),
            inputs: inputs.clone(),
            outline,
        })
    }

    pub fn generation_request(&self) -> Option<GenerationRequest> {
        let WizardState::Draft {
            bundle,
            inputs,
            outline,
        } = self
        else {
            return None;
        };
        Some(GenerationRequest {
            keyword: bundle.keyword.clone(),
            title: inputs.title.clone(),
            outline_name: outline.name.clone(),
            headers: outline.headers.clone(),
            tone: inputs.tone,
            word_count: inputs.word_count,
            related_keywords: inputs.related_keywords.clone(),
            competitor_references: bundle
                .competitors
                .iter()
                .map(|c| (c.title.clone(), c.url.clone()))
                .collect(),
            strategy: bundle.strategy.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PipelineStage, RunMode};

    fn bundle(keyword: &str) -> AnalysisBundle {
        AnalysisBundle {
            keyword: keyword.to_string(),
            mode: RunMode::Demo,
            competitors: Vec::new(),
            analyses: Vec::new(),
            strategy: None,
            serp_snapshot: Vec::new(),
            top_rank: None,
            raw_provider_response: serde_json::json!({}),
            stages: vec![PipelineStage::Idle, PipelineStage::Ready],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn related_keywords_are_trimmed_and_deduplicated() {
        assert_eq!(
            parse_related_keywords(" verify id, online scams ,, Verify ID, digital safety"),
            vec!["verify id", "online scams", "digital safety"]
        );
        assert!(parse_related_keywords("  ").is_empty());
    }

    #[test]
    fn inputs_require_title_and_known_word_count() {
        assert!(ContentInputs::new("  ", "", Tone::Casual, 1500).is_err());
        assert!(ContentInputs::new("T", "", Tone::Casual, 1234).is_err());
        let ok = ContentInputs::new(" Title ", "a,b", Tone::Technical, 2500).unwrap();
        assert_eq!(ok.title, "Title");
        assert_eq!(ok.related_keywords.len(), 2);
    }

    #[test]
    fn tone_parses_known_values() {
        assert_eq!("Educational".parse::<Tone>().unwrap(), Tone::Educational);
        assert!("snarky".parse::<Tone>().is_err());
    }

    #[test]
    fn three_outlines_with_seven_headers() {
        let o = outline_options("crm");
        assert_eq!(o.len(), 3);
        assert!(o.iter().all(|o| o.headers.len() == 7));
        assert_eq!(o[0].headers[0], "Introduction: what is crm?");
    }

    #[test]
    fn wizard_walks_all_steps_and_builds_generation_request() {
        let s0 = WizardState::default();
        assert_eq!(s0.step(), WizardStep::Research);
        assert!(s0
            .with_inputs(ContentInputs::new("T", "", Tone::Casual, 800).unwrap())
            .is_err());

        let s1 = WizardState::researched(bundle("crm"));
        assert!(s1.with_outline(1).is_err(), "inputs come before structure");

        let s2 = s1
            .with_inputs(ContentInputs::new("CRM guide", "sales", Tone::Professional, 1500).unwrap())
            .unwrap();
        assert_eq!(s2.step(), WizardStep::Structure);
        assert!(s2.with_outline(9).is_err());

        let s3 = s2.with_outline(2).unwrap();
        assert_eq!(s3.step(), WizardStep::Draft);
        let req = s3.generation_request().unwrap();
        assert_eq!(req.keyword, "crm");
        assert_eq!(req.outline_name, "Commercial");
        assert_eq!(req.headers[0], "The problem with crm");
        assert_eq!(req.related_keywords, vec!["sales"]);

        // previous states are untouched
        assert_eq!(s2.step(), WizardStep::Structure);
        assert!(s2.generation_request().is_none());
    }
}
