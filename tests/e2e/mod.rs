// End-to-end tests for the ConvoLab audio API
//
// Each test boots the full router on an ephemeral port. Persistence uses the
// in-memory pipeline repository and the speech, media and storage backends
// are fakes, so the suite runs without Postgres, ffmpeg or cloud credentials.
//
// The fakes follow one convention: an "audio file" holds its own duration in
// milliseconds as text. Every synthesized line lasts 500ms.

mod helpers;
mod test_courses;
mod test_generation;
mod test_health;
