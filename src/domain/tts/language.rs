/// Locale embedded in a Google voice name: `ja-JP-Neural2-B` -> `ja-JP`.
pub fn locale_for_voice(voice_id: &str) -> Option<String> {
    let mut parts = voice_id.split('-');
    let language = parts.next().filter(|p| p.len() == 2 || p.len() == 3)?;
    let region = parts.next().filter(|p| !p.is_empty())?;
    Some(format!("{}-{}", language, region))
}

/// Check if a Polly voice supports the neural engine
pub fn is_voice_neural_compatible(voice: &str) -> bool {
    // Based on AWS Polly documentation
    const NEURAL_VOICES: &[&str] = &[
        // English
        "Joanna", "Matthew", "Ivy", "Kendra", "Kimberly", "Salli", "Joey", "Justin", "Kevin",
        "Ruth", "Stephen", "Amy", "Brian", "Emma", // Spanish
        "Lupe", "Pedro", "Sergio", "Lucia", "Mia", // French
        "Lea", "Remi", // German
        "Vicki", "Daniel", // Italian
        "Bianca", "Adriano", // Portuguese
        "Ines", "Camila", "Vitoria", "Thiago", // Japanese
        "Takumi", "Kazuha", "Tomoko", // Korean
        "Seoyeon", // Mandarin Chinese
        "Zhiyu",   // Arabic
        "Hala", "Zayd",
    ];

    NEURAL_VOICES.contains(&voice)
}
