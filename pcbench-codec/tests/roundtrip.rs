use glam::Vec3;
use pcbench_codec::{
    CodecConfig, CodecError, ColorCodingType, HEADER_LEN, OctreeDecoder, OctreeEncoder,
    PointCloudDecoder, PointCloudEncoder,
};
use pcbench_data::{Point, PointCloud};

fn sample_cloud(count: usize) -> PointCloud {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let position = Vec3::new(
                t,
                (t * 7.0).fract(),
                0.5 + 0.4 * (t * std::f32::consts::TAU).sin(),
            );
            let color = [(t * 255.0) as u8, 60, (255.0 - t * 255.0) as u8];
            Point::new(position, color)
        })
        .collect()
}

fn config(octree_bits: u8, enh_bits: u8, coding: ColorCodingType, keep: bool) -> CodecConfig {
    CodecConfig::new(octree_bits, enh_bits, 6, coding, keep).unwrap()
}

fn encode(config: CodecConfig, cloud: &PointCloud) -> (Vec<u8>, pcbench_codec::LayerByteCounts) {
    let mut encoder = OctreeEncoder::new(config).unwrap();
    let mut stream = Vec::new();
    encoder.encode(cloud, &mut stream).unwrap();
    (stream, encoder.performance_metrics())
}

#[test]
fn test_decoded_points_stay_inside_their_voxel() {
    let cloud = sample_cloud(500);
    for coding in [ColorCodingType::Native, ColorCodingType::ImageBased] {
        let config = config(8, 0, coding, false);
        let (stream, _) = encode(config, &cloud);
        let decoded = OctreeDecoder::new(config).unwrap().decode(&stream).unwrap();

        assert!(!decoded.is_empty());
        assert!(decoded.len() <= cloud.len());
        let half_cell = 0.5 / 256.0 + 1e-5;
        for point in &cloud.points {
            let nearest = decoded
                .points
                .iter()
                .map(|d| (d.position - point.position).abs().max_element())
                .fold(f32::INFINITY, f32::min);
            assert!(nearest <= half_cell, "{nearest} > {half_cell}");
        }
    }
}

#[test]
fn test_centroid_layer_refines_positions() {
    let cloud = PointCloud::new(vec![
        Point::uncolored(Vec3::new(0.01, 0.01, 0.01)),
        Point::uncolored(Vec3::new(0.9, 0.8, 0.7)),
    ]);
    let coarse = config(2, 0, ColorCodingType::Native, true);
    let fine = config(2, 6, ColorCodingType::Native, true);

    let (coarse_stream, coarse_bytes) = encode(coarse, &cloud);
    let (fine_stream, fine_bytes) = encode(fine, &cloud);
    assert_eq!(coarse_bytes.centroid, 0);
    assert!(fine_bytes.centroid > 0);

    let coarse_cloud = OctreeDecoder::new(coarse).unwrap().decode(&coarse_stream).unwrap();
    let fine_cloud = OctreeDecoder::new(fine).unwrap().decode(&fine_stream).unwrap();

    let error = |decoded: &PointCloud| -> f32 {
        decoded
            .points
            .iter()
            .zip(&cloud.points)
            .map(|(d, o)| d.position.distance(o.position))
            .sum()
    };
    assert!(error(&fine_cloud) < error(&coarse_cloud));
}

#[test]
fn test_layer_counts_match_stream_length() {
    let cloud = sample_cloud(300);
    let (stream, bytes) = encode(config(7, 3, ColorCodingType::ImageBased, true), &cloud);
    assert_eq!(bytes.total() as usize, stream.len());
    assert!(bytes.octree as usize > HEADER_LEN);
}

#[test]
fn test_encoding_is_deterministic() {
    let cloud = sample_cloud(400);
    let other = sample_cloud(123);
    let config = config(9, 2, ColorCodingType::ImageBased, true);
    let mut encoder = OctreeEncoder::new(config).unwrap();

    let mut first = Vec::new();
    encoder.encode(&cloud, &mut first).unwrap();
    let first_bytes = encoder.performance_metrics();

    let mut scratch = Vec::new();
    encoder.encode(&other, &mut scratch).unwrap();

    let mut second = Vec::new();
    encoder.encode(&cloud, &mut second).unwrap();
    assert_eq!(first, second);
    assert_eq!(first_bytes, encoder.performance_metrics());
    assert_eq!(encoder.frames_encoded(), 3);
}

#[test]
fn test_decoder_rejects_other_config() {
    let cloud = sample_cloud(50);
    let (stream, _) = encode(config(8, 2, ColorCodingType::Native, true), &cloud);
    let mut decoder = OctreeDecoder::new(config(10, 2, ColorCodingType::Native, true)).unwrap();
    assert!(matches!(
        decoder.decode(&stream),
        Err(CodecError::ConfigMismatch { .. })
    ));
}

#[test]
fn test_decoder_rejects_truncated_stream() {
    let cloud = sample_cloud(50);
    let config = config(8, 2, ColorCodingType::Native, true);
    let (stream, _) = encode(config, &cloud);
    let mut decoder = OctreeDecoder::new(config).unwrap();

    let err = decoder.decode(&stream[..stream.len() - 3]).unwrap_err();
    assert!(matches!(err, CodecError::Truncated { .. }));
    let err = decoder.decode(&stream[..10]).unwrap_err();
    assert!(matches!(err, CodecError::Truncated { .. }));
}

#[test]
fn test_decoder_rejects_bad_magic() {
    let cloud = sample_cloud(20);
    let config = config(6, 0, ColorCodingType::Native, false);
    let (mut stream, _) = encode(config, &cloud);
    stream[0] = b'X';
    assert!(matches!(
        OctreeDecoder::new(config).unwrap().decode(&stream),
        Err(CodecError::BadMagic)
    ));
}

#[test]
fn test_encoder_rejects_unnormalized_and_empty_clouds() {
    let mut encoder = OctreeEncoder::new(config(8, 0, ColorCodingType::Native, false)).unwrap();
    let mut sink = Vec::new();

    let outside = PointCloud::new(vec![Point::uncolored(Vec3::new(0.2, -0.1, 0.3))]);
    assert!(matches!(
        encoder.encode(&outside, &mut sink),
        Err(CodecError::OutOfRange { index: 0, .. })
    ));
    assert!(matches!(
        encoder.encode(&PointCloud::default(), &mut sink),
        Err(CodecError::EmptyCloud)
    ));
    assert!(sink.is_empty());
}

#[test]
fn test_colors_survive_round_trip() {
    let cloud = PointCloud::new(vec![
        Point::new(Vec3::new(0.1, 0.1, 0.1), [255, 0, 0]),
        Point::new(Vec3::new(0.9, 0.9, 0.9), [0, 0, 255]),
    ]);
    let config = CodecConfig::new(4, 0, 8, ColorCodingType::ImageBased, false).unwrap();
    let (stream, _) = encode(config, &cloud);
    let decoded = OctreeDecoder::new(config).unwrap().decode(&stream).unwrap();

    let mut colors: Vec<[u8; 3]> = decoded.points.iter().map(|p| p.color).collect();
    colors.sort();
    assert_eq!(colors, vec![[0, 0, 255], [255, 0, 0]]);
}
