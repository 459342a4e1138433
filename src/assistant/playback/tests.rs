use super::*;
use tempfile::TempDir;

#[test]
fn parse_splits_program_and_arguments() {
    let player = Player::parse("  mpv --no-video   --really-quiet ").expect("player should parse");
    assert_eq!(player.program(), "mpv");
    assert_eq!(player.args(), ["--no-video", "--really-quiet"]);
}

#[test]
fn parse_rejects_blank_command() {
    assert_eq!(Player::parse(""), None);
    assert_eq!(Player::parse("   "), None);
}

#[test]
fn missing_program_is_a_playback_error() {
    let player = Player::parse("voice-rag-test-player-that-does-not-exist")
        .expect("player should parse");
    let result = player.play(Path::new("speech.mp3"));
    assert!(matches!(result, Err(RagError::Playback(_))));
}

#[cfg(unix)]
#[test]
fn successful_player_exit() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let audio = temp_dir.path().join("speech.mp3");
    std::fs::write(&audio, b"ID3").expect("should write audio");

    let player = Player::parse("test -f").expect("player should parse");
    player.play(&audio).expect("player should succeed");
}

#[cfg(unix)]
#[test]
fn failing_player_exit_is_reported() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let player = Player::parse("test -f").expect("player should parse");

    let result = player.play(&temp_dir.path().join("missing.mp3"));
    assert!(matches!(result, Err(RagError::Playback(message)) if message.contains("test")));
}
