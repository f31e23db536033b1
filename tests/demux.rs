use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use webp_container::{
    demux, full_size, mux, Anim, Anmf, Chunk, ChunkTag, Error, Scope, Vp8x, WebPImage,
};

fn chunk(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = fourcc.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn riff(body: &[u8]) -> Vec<u8> {
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(body);
    out
}

fn vp8l_1x1() -> Vec<u8> {
    vec![0x2f, 0x00, 0x00, 0x00, 0x00]
}

fn full_featured() -> WebPImage {
    WebPImage::extended(vec![
        Chunk::Vp8x(Vp8x::new(
            Vp8x::ICC | Vp8x::ANIMATION | Vp8x::EXIF | Vp8x::XMP | Vp8x::ALPHA,
            300,
            200,
        )),
        Chunk::Iccp(vec![0x11; 131]),
        Chunk::Anim(Anim::new(0x8000_ff00, 3)),
        Chunk::Anmf(Anmf::new(
            0,
            0,
            300,
            200,
            80,
            0,
            vec![Chunk::Alph(vec![0x22; 9]), Chunk::Vp8(vec![0x33; 17])],
        )),
        Chunk::Anmf(Anmf::new(
            5,
            7,
            11,
            13,
            0xff_ffff,
            0b11,
            vec![
                Chunk::Vp8l(vec![0x2f; 6]),
                Chunk::Unknown {
                    fourcc: *b"FRMX",
                    data: vec![1],
                },
            ],
        )),
        Chunk::Exif(b"Exif\0\0MM".to_vec()),
        Chunk::Unknown {
            fourcc: *b"BLAH",
            data: vec![0x01, 0x02, 0x03],
        },
        Chunk::Xmp(b"<x:xmpmeta/>".to_vec()),
    ])
    .unwrap()
}

#[test]
fn round_trip_preserves_every_chunk() {
    let image = full_featured();
    let mut bytes = Vec::new();
    mux(&image, &mut bytes).unwrap();
    assert_eq!(bytes.len() as u64, image.full_size());

    let again = demux(&bytes[..]).unwrap();
    assert_eq!(again, image);
    assert_eq!(again.to_bytes().unwrap(), bytes);

    let frames: Vec<_> = again.frames().collect();
    assert_eq!(frames[1].x_offset(), 10);
    assert_eq!(frames[1].duration(), 0xff_ffff);
    assert_eq!(frames[1].chunks()[1].tag(), ChunkTag::Unknown(*b"FRMX"));
    assert_eq!(again.icc_profile().map(<[u8]>::len), Some(131));
}

#[test]
fn extended_form_invariant() {
    for image in [
        full_featured(),
        demux(&riff(&chunk(b"VP8L", &vp8l_1x1()))[..]).unwrap(),
    ] {
        let chunks = image.chunks();
        if chunks.len() > 1 {
            assert_eq!(chunks[0].tag(), ChunkTag::Vp8x);
        } else {
            assert!(matches!(chunks[0].tag(), ChunkTag::Vp8 | ChunkTag::Vp8l));
        }
    }
}

macro_rules! padding {
    ($len:literal) => {
        paste::paste! {
            #[test]
            fn [<padding_ $len>]() {
                padding_case($len);
            }
        }
    };
    ($len:literal, $($tail:literal),+) => {
        padding!($len);
        padding!($($tail),+);
    };
}

fn padding_case(len: usize) {
    let payload: Vec<u8> = (0..len).map(|i| i as u8 ^ 0x5a).collect();
    let image = WebPImage::extended(vec![
        Chunk::Vp8x(Vp8x::new(0, 1, 1)),
        Chunk::Exif(payload.clone()),
        Chunk::Vp8l(vp8l_1x1()),
    ])
    .unwrap();

    let exif = &image.chunks()[1];
    assert_eq!(exif.full_size(), (len + 8 + len % 2) as u64);
    assert_eq!(exif.full_size(), full_size(len as u64));

    let bytes = image.to_bytes().unwrap();
    let start = 12 + 18;
    let end = start + 8 + len;
    assert_eq!(&bytes[start + 8..end], &payload[..]);
    if len % 2 == 1 {
        assert_eq!(bytes[end], 0);
        assert_eq!(&bytes[end + 1..end + 5], b"VP8L");
    } else {
        assert_eq!(&bytes[end..end + 4], b"VP8L");
    }

    assert_eq!(demux(&bytes[..]).unwrap(), image);
}

padding!(0, 1, 2, 3, 254, 255);

#[test]
fn dimensions_decode_one_based() {
    for (wire, expected) in [
        ([0u8, 0, 0], 1u32),
        ([0xff, 0, 0], 256),
        ([0xff, 0xff, 0xff], 1 << 24),
    ] {
        let mut vp8x = vec![0; 4];
        vp8x.extend_from_slice(&wire);
        vp8x.extend_from_slice(&wire);
        let mut body = chunk(b"VP8X", &vp8x);
        body.extend(chunk(b"VP8L", &vp8l_1x1()));

        let image = demux(&riff(&body)[..]).unwrap();
        let header = image.vp8x().unwrap();
        assert_eq!(header.canvas_width(), expected);
        assert_eq!(header.canvas_height(), expected);
    }
}

#[test]
fn unknown_tag_keeps_odd_payload() {
    let mut body = chunk(b"VP8X", &[0; 10]);
    body.extend(chunk(b"BLAH", &[0x01, 0x02, 0x03]));
    body.extend(chunk(b"VP8L", &vp8l_1x1()));
    let bytes = riff(&body);

    let image = demux(&bytes[..]).unwrap();
    let blah = &image.chunks()[1];
    assert_eq!(blah.payload_size(), 3);
    assert_eq!(&*blah.raw_data(), &[0x01, 0x02, 0x03]);
    assert_eq!(image.to_bytes().unwrap(), bytes);
}

#[test]
fn anmf_accounting_leaves_outer_budget_consistent() {
    let mut frame = vec![0u8; 16];
    frame.extend(chunk(b"VP8 ", &[0x10, 0x20, 0x30, 0x40, 0x50]));
    let anmf = chunk(b"ANMF", &frame);
    assert_eq!(anmf.len(), 38);

    let mut body = chunk(b"VP8X", &[Vp8x::ANIMATION as u8, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    body.extend(anmf);
    body.extend(chunk(b"EXIF", &[0xee]));
    let image = demux(&riff(&body)[..]).unwrap();

    assert_eq!(image.frames().count(), 1);
    assert_eq!(image.frames().next().unwrap().chunks().len(), 1);
    assert_eq!(image.exif(), Some(&[0xee][..]));
}

#[test]
fn second_sub_chunk_after_odd_alpha() {
    let mut frame = vec![0u8; 16];
    frame.extend(chunk(b"ALPH", &[0xaa; 3]));
    frame.extend(chunk(b"VP8 ", &[0xbb; 4]));

    let mut body = chunk(b"VP8X", &[0; 10]);
    body.extend(chunk(b"ANMF", &frame));
    let image = demux(&riff(&body)[..]).unwrap();

    let anmf = image.frames().next().unwrap();
    assert_eq!(anmf.alpha(), Some(&Chunk::Alph(vec![0xaa; 3])));
    assert_eq!(anmf.bitstream(), Some(&Chunk::Vp8(vec![0xbb; 4])));
}

#[test]
fn frame_size_mismatch_names_the_frame() {
    let mut frame = vec![0u8; 16];
    frame.extend(chunk(b"VP8L", &vp8l_1x1()));
    let good = chunk(b"ANMF", &frame);

    frame.truncate(16 + 8 + 2);
    let bad = chunk(b"ANMF", &frame);
    // sub-chunk still claims 5 bytes
    assert_eq!(bad[8 + 16 + 4], 5);

    let mut body = chunk(b"VP8X", &[0; 10]);
    body.extend(good);
    body.extend(bad);
    assert!(matches!(
        demux(&riff(&body)[..]),
        Err(Error::MalformedSize {
            scope: Scope::Frame(2),
            ..
        })
    ));
}

#[test]
fn truncated_inside_vp8x() {
    let mut bytes = riff(&chunk(b"VP8X", &[0; 10]));
    bytes.truncate(12 + 8 + 4);
    match demux(&bytes[..]) {
        Err(Error::Truncated { offset, .. }) => assert_eq!(offset, 24),
        other => panic!("expected truncation, got {:?}", other),
    }
}

#[test]
fn under_declared_file_is_rejected() {
    let bytes = full_featured().to_bytes().unwrap();
    for shrink in [2u32, 10, 100] {
        let mut bad = bytes.clone();
        let declared = u32::from_le_bytes([bad[4], bad[5], bad[6], bad[7]]) - shrink;
        bad[4..8].copy_from_slice(&declared.to_le_bytes());
        assert!(
            matches!(demux(&bad[..]), Err(Error::MalformedSize { .. })),
            "shrink by {}",
            shrink
        );
    }
}

#[test]
fn random_truncation_always_fails_cleanly() {
    let bytes = full_featured().to_bytes().unwrap();
    let mut rng = StdRng::seed_from_u64(0x5745_4250);
    for _ in 0..200 {
        let cut = rng.gen_range(0..bytes.len());
        let err = demux(&bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, Error::Truncated { .. }),
            "cut at {}: {:?}",
            cut,
            err
        );
    }
}

#[test]
fn random_corruption_never_panics() {
    let bytes = full_featured().to_bytes().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let mut bad = bytes.clone();
        for _ in 0..rng.gen_range(1..4) {
            let at = rng.gen_range(0..bad.len());
            bad[at] = rng.gen();
        }
        if let Ok(image) = demux(&bad[..]) {
            assert_eq!(image.to_bytes().unwrap().len() as u64, image.full_size());
        }
    }
}
