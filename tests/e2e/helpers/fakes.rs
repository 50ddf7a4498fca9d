use async_trait::async_trait;
use convolab_audio::domain::tts::{
    ProviderKind, SynthesisOutput, SynthesisRequest, Timepoint, TtsError,
};
use convolab_audio::infrastructure::media::{parse_concat_list, MediaError, MediaToolkit};
use convolab_audio::infrastructure::repositories::{
    StorageError, StorageRepository, TtsRepository, UploadSource,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const LINE_MS: u64 = 500;

/// Speech provider where every marked line lasts [`LINE_MS`].
#[derive(Default)]
pub struct FakeTts {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl FakeTts {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl TtsRepository for FakeTts {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutput, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TtsError::provider(
                ProviderKind::for_voice(&request.voice_id),
                "quota exceeded",
            ));
        }

        let marks: Vec<String> = request
            .ssml
            .split("<mark name=\"")
            .skip(1)
            .filter_map(|chunk| chunk.split('"').next().map(str::to_string))
            .collect();
        let timepoints = marks
            .iter()
            .enumerate()
            .map(|(i, name)| Timepoint::new(name.clone(), (i as u64 * LINE_MS) as f64 / 1000.0))
            .collect();

        Ok(SynthesisOutput {
            audio: (marks.len() as u64 * LINE_MS).to_string().into_bytes(),
            timepoints,
        })
    }
}

/// Media toolkit operating on duration-as-text files.
#[derive(Default)]
pub struct FakeMedia;

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn probe_duration_ms(&self, path: &Path) -> Result<u64, MediaError> {
        let text = tokio::fs::read_to_string(path).await?;
        text.trim().parse().map_err(|_| MediaError::Probe {
            path: path.to_path_buf(),
            message: text.clone(),
        })
    }

    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn render_silence(&self, duration_ms: u64, output: &Path) -> Result<(), MediaError> {
        tokio::fs::write(output, duration_ms.to_string()).await?;
        Ok(())
    }

    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), MediaError> {
        let list = tokio::fs::read_to_string(list_file).await?;
        let mut total = 0;
        for entry in parse_concat_list(&list) {
            total += match (entry.inpoint_ms, entry.outpoint_ms) {
                (Some(start), Some(end)) => end - start,
                _ => self.probe_duration_ms(&entry.path).await?,
            };
        }
        tokio::fs::write(output, total.to_string()).await?;
        Ok(())
    }
}

/// Keeps uploaded objects in memory, keyed by their public URL.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStorage {
    pub fn upload_count(&self) -> usize {
        self.objects.lock().len()
    }

    #[allow(dead_code)]
    pub fn object(&self, url: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .iter()
            .find(|(stored, _)| stored == url)
            .map(|(_, bytes)| bytes.clone())
    }
}

#[async_trait]
impl StorageRepository for MemoryStorage {
    async fn upload(
        &self,
        source: UploadSource,
        filename: &str,
        _content_type: &str,
        folder: &str,
    ) -> Result<String, StorageError> {
        let bytes = source.read().await?;
        let url = format!("memory://{}/{}", folder, filename);
        self.objects.lock().push((url.clone(), bytes));
        Ok(url)
    }
}
