//! Tests for the animated-WebP probe and the loader.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{FrameSpec, GifBuilder, BLUE, RED};
use zengif::{
    classify_animated, load_animation, probe_animated, ByteSource, ComposedImage, DecodeConfig,
    DecodeError, FetchError, Limits, LoadError, ManualScheduler, PlatformDecoder, PlatformError,
    PlatformFrame, Player, PlayerConfig, RgbaImage, SourceFormat, SourceFrame,
};

/// RIFF/WEBP header with the given first chunk tag and VP8X flags, padded
/// to `len` bytes.
fn webp_header(chunk: &[u8; 4], flags: u8, len: usize) -> Vec<u8> {
    let mut h = Vec::new();
    h.extend_from_slice(b"RIFF");
    h.extend_from_slice(&((len.max(8) - 8) as u32).to_le_bytes());
    h.extend_from_slice(b"WEBP");
    h.extend_from_slice(chunk);
    h.extend_from_slice(&10u32.to_le_bytes());
    h.push(flags);
    h.resize(len.max(h.len()), 0);
    h
}

/// A source that always fails.
struct Offline;

impl ByteSource for Offline {
    fn fetch(&mut self, _limit: Option<usize>) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unavailable("offline".to_string()))
    }
}

/// A source that records the limits it was asked for.
struct Recording {
    data: Vec<u8>,
    requests: Vec<Option<usize>>,
}

impl ByteSource for Recording {
    fn fetch(&mut self, limit: Option<usize>) -> Result<Vec<u8>, FetchError> {
        self.requests.push(limit);
        self.data.as_slice().fetch(limit)
    }
}

// ============================================================================
// Probe
// ============================================================================

#[test]
fn classify_animated_vp8x() {
    assert!(classify_animated(&webp_header(b"VP8X", 0x02, 30)));
    assert!(!classify_animated(&webp_header(b"VP8X", 0x00, 30)));
    assert!(!classify_animated(&webp_header(b"VP8 ", 0x02, 30)));
    assert!(!classify_animated(&webp_header(b"VP8X", 0x02, 30)[..23]));
    assert!(!classify_animated(&[]));
}

#[test]
fn probe_requests_prefix_only() {
    let mut source = Recording {
        data: webp_header(b"VP8X", 0x12, 4096),
        requests: Vec::new(),
    };
    assert!(probe_animated(&mut source));
    assert_eq!(source.requests, vec![Some(zengif::probe::PROBE_LEN)]);
}

#[test]
fn probe_failure_is_not_animated() {
    assert!(!probe_animated(&mut Offline));
}

// ============================================================================
// GIF loading
// ============================================================================

#[test]
fn load_gif_from_bytes() {
    let data = GifBuilder::new(2, 1)
        .palette(vec![RED, BLUE])
        .frame(FrameSpec::solid(0, 0, 2, 1, 0))
        .frame(FrameSpec::solid(1, 0, 1, 1, 1))
        .build();
    let mut source = data.clone();
    let animation =
        load_animation(&mut source, SourceFormat::Gif, &DecodeConfig::default(), None).unwrap();
    assert_eq!((animation.width(), animation.height()), (2, 1));
    assert_eq!(animation.frame_count(), 2);
    assert!(matches!(animation.frames()[0], SourceFrame::Indexed(_)));
    assert_eq!(SourceFormat::sniff(&data), Some(SourceFormat::Gif));
}

#[test]
fn load_gif_format_error() {
    let mut source = b"NOTAGIF-at-all".to_vec();
    let result = load_animation(&mut source, SourceFormat::Gif, &DecodeConfig::default(), None);
    assert!(matches!(
        result,
        Err(LoadError::Format(DecodeError::InvalidSignature(_)))
    ));
}

#[test]
fn load_gif_network_error() {
    let result = load_animation(&mut Offline, SourceFormat::Gif, &DecodeConfig::default(), None);
    assert!(matches!(result, Err(LoadError::Network(_))));
}

#[test]
fn load_gif_from_file() {
    let data = GifBuilder::new(1, 1)
        .palette(vec![RED, BLUE])
        .frame(FrameSpec::solid(0, 0, 1, 1, 1))
        .build();
    let path = std::env::temp_dir().join(format!("zengif-load-{}.gif", std::process::id()));
    std::fs::write(&path, &data).unwrap();

    let mut source = zengif::FileSource::new(&path);
    assert_eq!(source.fetch(Some(3)).unwrap(), b"GIF");
    let animation =
        load_animation(&mut source, SourceFormat::Gif, &DecodeConfig::default(), None).unwrap();
    assert_eq!(animation.frame_count(), 1);

    std::fs::remove_file(&path).ok();
}

// ============================================================================
// WebP loading via a platform decoder
// ============================================================================

struct TrackedImage {
    inner: RgbaImage,
    released: Rc<Cell<usize>>,
}

impl ComposedImage for TrackedImage {
    fn width(&self) -> u32 {
        self.inner.width
    }

    fn height(&self) -> u32 {
        self.inner.height
    }

    fn rgba(&self) -> &[u8] {
        &self.inner.data
    }

    fn release(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

struct MockPlatform {
    frames: usize,
    released: Rc<Cell<usize>>,
    calls: usize,
}

impl MockPlatform {
    fn new(frames: usize) -> Self {
        Self {
            frames,
            released: Rc::new(Cell::new(0)),
            calls: 0,
        }
    }
}

impl PlatformDecoder for MockPlatform {
    fn decode(
        &mut self,
        data: &[u8],
        format: SourceFormat,
    ) -> Result<Vec<PlatformFrame>, PlatformError> {
        self.calls += 1;
        assert_eq!(format, SourceFormat::WebP);
        if !classify_animated(data) {
            return Err(PlatformError("not animated".to_string()));
        }
        Ok((0..self.frames)
            .map(|i| PlatformFrame {
                image: Box::new(TrackedImage {
                    inner: RgbaImage {
                        width: 2,
                        height: 2,
                        data: vec![i as u8; 16],
                    },
                    released: Rc::clone(&self.released),
                }),
                duration_us: 50_000 + i as u64 * 1_000,
            })
            .collect())
    }
}

#[test]
fn webp_without_platform_is_unsupported() {
    let mut source = webp_header(b"VP8X", 0x02, 64);
    let result = load_animation(&mut source, SourceFormat::WebP, &DecodeConfig::default(), None);
    assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
}

#[test]
fn static_webp_is_unsupported() {
    let mut platform = MockPlatform::new(2);
    let mut source = webp_header(b"VP8X", 0x10, 64);
    let result = load_animation(
        &mut source,
        SourceFormat::WebP,
        &DecodeConfig::default(),
        Some(&mut platform),
    );
    assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
    assert_eq!(platform.calls, 0);
}

#[test]
fn empty_platform_result_is_unsupported() {
    let mut platform = MockPlatform::new(0);
    let mut source = webp_header(b"VP8X", 0x02, 64);
    let result = load_animation(
        &mut source,
        SourceFormat::WebP,
        &DecodeConfig::default(),
        Some(&mut platform),
    );
    assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
}

#[test]
fn webp_frame_limit() {
    let mut platform = MockPlatform::new(3);
    let mut source = webp_header(b"VP8X", 0x02, 64);
    let config = DecodeConfig::default().limits(Limits::none().max_frame_count(2));
    let result = load_animation(&mut source, SourceFormat::WebP, &config, Some(&mut platform));
    assert!(matches!(
        result,
        Err(LoadError::Format(DecodeError::LimitExceeded(_)))
    ));
    // Frames handed back by the platform are still released.
    assert_eq!(platform.released.get(), 3);
}

#[test]
fn webp_plays_and_releases_on_teardown() {
    let mut platform = MockPlatform::new(3);
    let mut source = webp_header(b"VP8X", 0x02, 64);
    let animation = load_animation(
        &mut source,
        SourceFormat::WebP,
        &DecodeConfig::default(),
        Some(&mut platform),
    )
    .unwrap();
    assert_eq!((animation.width(), animation.height()), (2, 2));
    let delays: Vec<u32> = animation.frames().iter().map(SourceFrame::delay_ms).collect();
    assert_eq!(delays, vec![50, 51, 52]);

    let mut shown = Vec::new();
    let player = Player::new(
        animation,
        PlayerConfig::default(),
        ManualScheduler::new(),
        |frame: zengif::EmittedFrame<'_>| shown.push(frame.rgba[0]),
    )
    .unwrap();
    assert_eq!(platform.released.get(), 0);
    player.teardown();
    assert_eq!(platform.released.get(), 3);
    assert_eq!(shown, vec![0]);
}

#[test]
fn platform_error_is_reported() {
    struct Failing;
    impl PlatformDecoder for Failing {
        fn decode(
            &mut self,
            _data: &[u8],
            _format: SourceFormat,
        ) -> Result<Vec<PlatformFrame>, PlatformError> {
            Err(PlatformError("codec missing".to_string()))
        }
    }

    let mut source = webp_header(b"VP8X", 0x02, 64);
    let result = load_animation(
        &mut source,
        SourceFormat::WebP,
        &DecodeConfig::default(),
        Some(&mut Failing),
    );
    assert!(matches!(result, Err(LoadError::Platform(_))));
}
