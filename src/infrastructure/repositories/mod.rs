pub mod gcs_storage_repository;
pub mod google_tts_repository;
pub mod in_memory_pipeline_repository;
pub mod local_storage_repository;
pub mod pg_pipeline_repository;
pub mod pipeline_repository;
pub mod polly_tts_repository;
pub mod storage_repository;
pub mod tts_repository;

pub use gcs_storage_repository::GcsStorageRepository;
pub use google_tts_repository::GoogleTtsRepository;
pub use in_memory_pipeline_repository::InMemoryPipelineRepository;
pub use local_storage_repository::LocalStorageRepository;
pub use pg_pipeline_repository::PgPipelineRepository;
pub use pipeline_repository::PipelineRepository;
pub use polly_tts_repository::PollyTtsRepository;
pub use storage_repository::{StorageError, StorageRepository, UploadSource};
pub use tts_repository::TtsRepository;
