//! API route handlers, organized by domain.

mod crawl;
mod system;

pub use crawl::{
    ResumeRequest, StartCrawlRequest, __path_list_sessions, __path_pause_session,
    __path_resume_session, __path_retry_failed, __path_session_status, __path_start_crawl,
    list_sessions, pause_session, resume_session, retry_failed, session_status, start_crawl,
};
pub use system::{
    __path_event_stream, __path_health_check, __path_news_stats, __path_openapi_spec, event_stream,
    health_check, news_stats, openapi_spec,
};
