pub use client::{parse_result_page, ResultsClient};
pub use error::{GenerationError, RenderError, Result, RoastError, ScrapeError};
pub use gemini::{parse_roast_response, GeminiClient};
pub use hyresult_scraper::RESULTS_DOMAIN;
pub use prompt::{build_prompt, slowest_split};
pub use roaster::{validate_results_url, RoastOutcome, Roaster};

pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub(crate) mod hyresult_scraper;
pub mod model;
pub mod prompt;
pub mod roaster;
pub mod server;
pub mod share_card;
