// sitekeep-api: Async HTTP collaborators used by the maintenance engine.

pub mod error;
pub mod fetch;
pub mod mail;
pub mod recommend;
pub mod storage;
pub mod transport;

pub use error::Error;
pub use fetch::{ProbeResponse, SiteFetcher};
pub use mail::{DEFAULT_MAIL_API_URL, ReportMailer, ResendMailer};
pub use recommend::{
    DEFAULT_RECOMMEND_API_URL, DEFAULT_RECOMMEND_MODEL, OpenAiRecommender, Recommender,
};
pub use storage::{FsObjectStore, HttpObjectStore, ObjectStore};
pub use transport::TransportConfig;
