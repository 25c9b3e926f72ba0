//! Docket Denoiser
//!
//! The convergence engine of the pipeline. [`ComplaintDenoiser`] measures how
//! noisy the case graphs still are, picks the next questions to ask, and applies
//! answers back to the graphs as [`AnswerDiff`]s.
//!
//! # Noise
//!
//! ```text
//! noise = (w_gap * gaps + w_req * unsatisfied + w_unc * uncertainty) / Σw
//! ```
//!
//! Each component lies in `[0, 1]`, so the noise level does too. Question
//! selection is epsilon-greedy over momentum-smoothed question values, driven by
//! a seeded RNG so the same configuration reproduces the same interview.
//!
//! # Examples
//!
//! ```
//! use docket_denoiser::ComplaintDenoiser;
//! use docket_extractor::{DependencyGraphBuilder, KnowledgeGraphBuilder};
//!
//! let mut kg = KnowledgeGraphBuilder::default().build_from_text("I was fired after I complained.");
//! let mut dg = DependencyGraphBuilder::default().build_from_knowledge_graph(&kg);
//!
//! let mut denoiser = ComplaintDenoiser::default();
//! let before = denoiser.calculate_noise_level(&kg, &dg);
//! let question = denoiser.generate_questions(&kg, &dg, 1).remove(0);
//! denoiser.process_answer(&question, "I reported my manager to HR in writing on 2024-02-01", &mut kg, &mut dg);
//! assert!(denoiser.calculate_noise_level(&kg, &dg) <= before);
//! ```

#![warn(missing_docs)]

mod config;
mod denoiser;
mod error;
mod question;

pub use config::{DenoiserConfig, ExplorationConfig};
pub use denoiser::ComplaintDenoiser;
pub use error::DenoiserError;
pub use question::{AnswerDiff, ConversationTurn, Question, QuestionTarget};
