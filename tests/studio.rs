use std::io::Cursor;
use std::sync::atomic::Ordering;
use std::time::Duration;

use sightloop::{
    BBox, DetectError, Mode, Prediction, RefreshTicker, StubDetector, StubLoader, Studio,
    StudioConfig, SyntheticCamera, SyntheticPlayback,
};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    sightloop::frame::test_pattern(width, height, 0)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn person() -> Prediction {
    Prediction::new(BBox::new(10.0, 12.0, 60.0, 80.0), "person", 0.87)
}

fn loader() -> StubLoader {
    StubLoader::with_predictions(vec![person()])
}

#[tokio::test]
async fn image_upload_detects_records_and_presents() {
    let loader = loader();
    let mut studio = Studio::init(&loader, StudioConfig::default()).await.unwrap();

    let record = studio
        .ingest_file("photo.png", "image/png", &png_bytes(120, 90))
        .await
        .unwrap()
        .expect("image ingest produces a record");

    assert_eq!(studio.mode(), Mode::Image);
    assert_eq!(record.predictions, vec![person()]);
    assert_eq!(record.display_name, "photo.png");
    assert_eq!(studio.history().len(), 1);
    assert!(!studio.canvas().is_blank());

    let blob = studio.export().unwrap();
    assert!(blob.file_name.starts_with("detection-result-"));
    assert!(image::load_from_memory(&blob.bytes).is_ok());
}

#[tokio::test]
async fn rejected_file_changes_nothing() {
    let loader = loader();
    let mut config = StudioConfig::default();
    config.video_enabled = false;
    let mut studio = Studio::init(&loader, config).await.unwrap();

    studio
        .ingest_file("ok.png", "image/png", &png_bytes(32, 32))
        .await
        .unwrap();

    // Oversize claim: the ceiling is 10MB when video is disabled.
    let err = studio
        .ingest_file("huge.png", "image/png", &vec![0u8; 11 * 1024 * 1024])
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DetectError::InvalidInput(_)));

    let err = studio
        .ingest_file("clip.mp4", "video/mp4", &[0u8; 16])
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DetectError::InvalidInput(_)));

    // History still holds only the accepted upload.
    assert_eq!(studio.history().len(), 1);
    assert_eq!(studio.mode(), Mode::Image);
}

#[tokio::test]
async fn leaving_webcam_mode_stops_all_tracks() {
    let loader = loader();
    let mut studio = Studio::init(&loader, StudioConfig::default()).await.unwrap();

    let camera = SyntheticCamera::new();
    let probe = camera.track_probe();
    studio.select_mode(Mode::Webcam, &camera).await.unwrap();
    assert_eq!(studio.mode(), Mode::Webcam);
    assert_eq!(probe.load(Ordering::SeqCst), 1);

    studio.select_mode(Mode::Image, &camera).await.unwrap();
    assert_eq!(probe.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn camera_denial_keeps_previous_mode() {
    let loader = loader();
    let mut studio = Studio::init(&loader, StudioConfig::default()).await.unwrap();

    let err = studio
        .select_mode(Mode::Webcam, &sightloop::DeniedCamera)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DetectError::MediaAcquisition(_)));
    assert_eq!(studio.mode(), Mode::Image);
}

#[tokio::test]
async fn history_replay_skips_the_detector() {
    let loader = loader();
    let stub = loader.detector().unwrap();
    let mut studio = Studio::init(&loader, StudioConfig::default()).await.unwrap();

    studio
        .ingest_file("photo.png", "image/png", &png_bytes(48, 48))
        .await
        .unwrap();
    let calls_after_upload = stub.calls();

    studio.canvas().clear();
    studio.show_history_entry(0).unwrap();
    assert!(!studio.canvas().is_blank());
    assert_eq!(stub.calls(), calls_after_upload);

    let err = studio.show_history_entry(3).err().unwrap();
    assert!(matches!(err, DetectError::InvalidInput(_)));
}

#[tokio::test]
async fn clear_resets_history_and_canvas() {
    let loader = loader();
    let mut studio = Studio::init(&loader, StudioConfig::default()).await.unwrap();

    studio
        .ingest_file("photo.png", "image/png", &png_bytes(48, 48))
        .await
        .unwrap();
    studio.clear();

    assert!(studio.history().is_empty());
    assert!(studio.canvas().is_blank());
    assert!(matches!(
        studio.export().err().unwrap(),
        DetectError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn model_load_failure_is_fatal() {
    let loader = StubLoader::failing("weights missing");
    let err = Studio::init(&loader, StudioConfig::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DetectError::ModelLoad(_)));
    assert!(err.is_fatal());
}

#[tokio::test(start_paused = true)]
async fn accepted_video_runs_the_loop_once_playback_is_bound() {
    let loader = StubLoader::new(
        StubDetector::new()
            .with_predictions(vec![person()])
            .with_latency(Duration::from_millis(20)),
    );
    let mut studio = Studio::init(&loader, StudioConfig::default()).await.unwrap();

    let accepted = studio
        .ingest_file("clip.mp4", "video/mp4", &[0u8; 1024])
        .await
        .unwrap();
    assert!(accepted.is_none());
    assert_eq!(studio.mode(), Mode::Video);

    // No surface bound yet: nothing to run over.
    let mut ticker = RefreshTicker::new(Duration::from_millis(33));
    assert!(studio.run_live(&mut ticker).await.is_err());

    let (surface, control) = SyntheticPlayback::new(64, 48);
    studio.bind_playback(Box::new(surface), "clip.mp4");
    control.set_ready();
    control.play();

    let controller = studio.controller();
    let stopper = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        controller.stop();
    };
    let mut ticker = RefreshTicker::new(Duration::from_millis(33));
    let (run, ()) = tokio::join!(studio.run_live(&mut ticker), stopper);
    run.unwrap();

    assert!(studio.controller().stats().frames_processed >= 1);
    assert!(!studio.canvas().is_blank());
}

#[tokio::test]
async fn webcam_live_run_presents_composites() {
    let loader = loader();
    let mut studio = Studio::init(&loader, StudioConfig::default()).await.unwrap();

    let camera = SyntheticCamera::new();
    let probe = camera.track_probe();
    studio.select_mode(Mode::Webcam, &camera).await.unwrap();

    let controller = studio.controller();
    let stopper = async {
        tokio::time::sleep(Duration::from_millis(120)).await;
        controller.stop();
    };
    let mut ticker = RefreshTicker::new(Duration::from_millis(15));
    let (run, ()) = tokio::join!(studio.run_live(&mut ticker), stopper);
    run.unwrap();

    assert!(studio.controller().stats().frames_processed >= 1);
    assert!(!studio.canvas().is_blank());

    studio.teardown();
    assert_eq!(probe.load(Ordering::SeqCst), 0);
}
