use super::error::AudioError;
use super::model::{AssemblyResult, SegmentTiming};
use super::silence::SilenceCache;
use super::timing::{reconcile, MarkSegment};
use crate::domain::script::ScriptUnit;
use crate::domain::tts::{group, Batch, BatchPlan, ProviderKind, TtsService};
use crate::infrastructure::jobs::ProgressReporter;
use crate::infrastructure::media::{render_concat_list, ConcatEntry, MediaToolkit};
use crate::infrastructure::repositories::{StorageRepository, UploadSource};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub const PROGRESS_SYNTHESIZED: u8 = 60;
pub const PROGRESS_ASSEMBLED: u8 = 85;

const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// One batch after synthesis: its normalized audio and per-mark spans.
struct RenderedBatch {
    batch_index: usize,
    audio_path: PathBuf,
    segments: Vec<MarkSegment>,
}

/// A unit's slice of some batch audio.
struct UnitSlice {
    audio_path: PathBuf,
    start_ms: u64,
    end_ms: u64,
}

/// Turns a batch plan into one published audio file with per-unit timing.
pub struct AudioAssembler {
    tts: Arc<TtsService>,
    media: Arc<dyn MediaToolkit>,
    storage: Arc<dyn StorageRepository>,
}

impl AudioAssembler {
    pub fn new(
        tts: Arc<TtsService>,
        media: Arc<dyn MediaToolkit>,
        storage: Arc<dyn StorageRepository>,
    ) -> Self {
        Self { tts, media, storage }
    }

    /// Fresh silence cache bound to this assembler's media toolkit.
    pub fn silence_cache(&self) -> Result<SilenceCache, AudioError> {
        SilenceCache::new(self.media.clone())
    }

    /// Synthesize every batch, lay units and pauses out in original order
    /// and upload the concatenated result under `folder`.
    ///
    /// `unit_count` is the length of the script the plan was grouped from.
    /// Any failure aborts the whole assembly and nothing is uploaded.
    pub async fn assemble(
        &self,
        plan: &BatchPlan,
        unit_count: usize,
        folder: &str,
        silence: &SilenceCache,
        progress: &dyn ProgressReporter,
    ) -> Result<AssemblyResult, AudioError> {
        let start_time = std::time::Instant::now();
        let workspace = tempfile::Builder::new().prefix("assembly-").tempdir()?;

        let rendered = self.synthesize_all(&plan.batches, workspace.path()).await?;
        progress.report(PROGRESS_SYNTHESIZED);

        let slices = slices_by_unit(&plan.batches, rendered)?;

        let mut entries = Vec::with_capacity(slices.len() + plan.pauses.len());
        let mut segments = Vec::with_capacity(slices.len());
        let mut clock_ms: u64 = 0;

        for index in 0..unit_count {
            if let Some(slice) = slices.get(&index) {
                let duration_ms = slice.end_ms.saturating_sub(slice.start_ms);
                if duration_ms > 0 {
                    entries.push(ConcatEntry::slice(
                        &slice.audio_path,
                        slice.start_ms,
                        slice.end_ms,
                    ));
                }
                segments.push(SegmentTiming {
                    unit_index: index,
                    start_time_ms: clock_ms,
                    end_time_ms: clock_ms + duration_ms,
                });
                clock_ms += duration_ms;
            } else if let Some(seconds) = plan.pauses.get(&index) {
                let duration_ms = (seconds * 1000.0).round() as u64;
                if duration_ms > 0 {
                    let clip = silence.clip(duration_ms).await?;
                    entries.push(ConcatEntry::whole(clip.as_path()));
                    clock_ms += duration_ms;
                }
            }
        }

        if entries.is_empty() {
            return Err(AudioError::NothingToRender);
        }

        let list_path = workspace.path().join("concat.txt");
        tokio::fs::write(&list_path, render_concat_list(&entries)).await?;
        let output_path = workspace.path().join("lesson.mp3");
        self.media.concat(&list_path, &output_path).await?;
        let total_duration_ms = self.media.probe_duration_ms(&output_path).await?;
        progress.report(PROGRESS_ASSEMBLED);

        if total_duration_ms.abs_diff(clock_ms) > 250 {
            tracing::warn!(
                timeline_ms = clock_ms,
                probed_ms = total_duration_ms,
                "Concatenated audio length differs from computed timeline"
            );
        }

        let filename = format!("{}.mp3", Uuid::new_v4());
        let audio_url = self
            .storage
            .upload(
                UploadSource::File(output_path),
                &filename,
                AUDIO_CONTENT_TYPE,
                folder,
            )
            .await?;

        tracing::info!(
            audio_url = %audio_url,
            batch_count = plan.batches.len(),
            segment_count = segments.len(),
            fragment_count = entries.len(),
            total_duration_ms = total_duration_ms,
            latency_ms = start_time.elapsed().as_millis(),
            "Lesson audio assembled"
        );

        Ok(AssemblyResult {
            audio_url,
            segments,
            total_duration_ms,
        })
    }

    /// Render the same script at several speed multipliers, sharing one
    /// silence cache across the renders.
    pub async fn assemble_variants(
        &self,
        units: &[ScriptUnit],
        native_language: &str,
        target_language: &str,
        speeds: &[f64],
        folder: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<AssemblyResult>, AudioError> {
        let silence = self.silence_cache()?;
        let mut results = Vec::with_capacity(speeds.len());

        for speed in speeds {
            let scaled = scale_speed(units, *speed);
            let plan = group(&scaled, native_language, target_language);
            let variant_folder = format!("{}/{}x", folder.trim_end_matches('/'), speed);
            tracing::info!(speed = speed, folder = %variant_folder, "Rendering speed variant");
            results.push(
                self.assemble(&plan, scaled.len(), &variant_folder, &silence, progress)
                    .await?,
            );
        }

        Ok(results)
    }

    /// Batches sharing a provider voice run one after another; different
    /// voices run concurrently.
    async fn synthesize_all(
        &self,
        batches: &[Batch],
        workspace: &Path,
    ) -> Result<Vec<RenderedBatch>, AudioError> {
        let mut groups: Vec<((ProviderKind, &str), Vec<usize>)> = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let key = (ProviderKind::for_voice(&batch.voice_id), batch.voice_id.as_str());
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, indices)) => indices.push(index),
                None => groups.push((key, vec![index])),
            }
        }

        tracing::debug!(
            batch_count = batches.len(),
            voice_group_count = groups.len(),
            "Synthesizing batches"
        );

        let per_group = futures::future::try_join_all(groups.into_iter().map(
            |(_, indices)| async move {
                let mut rendered = Vec::with_capacity(indices.len());
                for index in indices {
                    rendered.push(self.render_batch(index, &batches[index], workspace).await?);
                }
                Ok::<_, AudioError>(rendered)
            },
        ))
        .await?;

        Ok(per_group.into_iter().flatten().collect())
    }

    async fn render_batch(
        &self,
        batch_index: usize,
        batch: &Batch,
        workspace: &Path,
    ) -> Result<RenderedBatch, AudioError> {
        let output = self
            .tts
            .synthesize_batch(batch)
            .await
            .map_err(|source| AudioError::Synthesis {
                batch_index,
                source,
            })?;

        let raw_path = workspace.join(format!("batch_{}.mp3", batch_index));
        let audio_path = workspace.join(format!("batch_{}.wav", batch_index));
        tokio::fs::write(&raw_path, &output.audio).await?;
        self.media.normalize(&raw_path, &audio_path).await?;
        let duration_ms = self.media.probe_duration_ms(&audio_path).await?;

        Ok(RenderedBatch {
            batch_index,
            audio_path,
            segments: reconcile(duration_ms, &output.timepoints),
        })
    }
}

/// Index every batched unit by its original position, failing on any unit
/// the provider did not report a mark for.
fn slices_by_unit(
    batches: &[Batch],
    rendered: Vec<RenderedBatch>,
) -> Result<HashMap<usize, UnitSlice>, AudioError> {
    let mut slices = HashMap::new();

    for rendered_batch in rendered {
        let by_mark: HashMap<&str, &MarkSegment> = rendered_batch
            .segments
            .iter()
            .map(|segment| (segment.mark_name.as_str(), segment))
            .collect();

        for unit in &batches[rendered_batch.batch_index].units {
            let segment = by_mark
                .get(unit.mark_name.as_str())
                .ok_or_else(|| AudioError::MissingMark {
                    mark_name: unit.mark_name.clone(),
                })?;
            slices.insert(
                unit.original_index,
                UnitSlice {
                    audio_path: rendered_batch.audio_path.clone(),
                    start_ms: segment.start_ms,
                    end_ms: segment.end_ms,
                },
            );
        }
    }

    Ok(slices)
}

/// Multiply every target unit's speed by `factor`.
pub fn scale_speed(units: &[ScriptUnit], factor: f64) -> Vec<ScriptUnit> {
    units
        .iter()
        .cloned()
        .map(|unit| match unit {
            ScriptUnit::Target {
                text,
                reading,
                translation,
                voice_id,
                speed,
                pitch,
                phrase_context,
            } => ScriptUnit::Target {
                text,
                reading,
                translation,
                voice_id,
                speed: speed * factor,
                pitch,
                phrase_context,
            },
            other => other,
        })
        .collect()
}
