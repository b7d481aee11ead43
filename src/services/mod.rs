pub mod contact_log;
pub mod face_api;
pub mod notify;
pub mod storage;
pub mod watermark;
