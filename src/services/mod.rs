pub mod build_service;
pub mod cdn_service;
pub mod manifest_service;
pub mod packaging_service;
pub mod process;
pub mod storage_service;
