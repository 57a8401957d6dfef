//! Colour layer coders.

use crate::bits::{BitReader, BitWriter, read_varint, unzigzag, write_varint, zigzag};
use crate::config::ColorCodingType;
use crate::error::CodecError;

fn quantize(value: u8, bits: u8) -> u32 {
    (value >> (8 - bits)) as u32
}

/// Reconstruct at the middle of the quantisation bin.
fn dequantize(value: u32, bits: u8) -> u8 {
    let shift = 8 - bits;
    if shift == 0 {
        value as u8
    } else {
        ((value << shift) | (1 << (shift - 1))) as u8
    }
}

/// Width of the raster the image-based coder lays the voxel colours out in.
fn raster_width(count: usize) -> usize {
    ((count as f64).sqrt().ceil() as usize).max(1)
}

/// Predict a sample from its left neighbour, or the one above at row start.
fn predict(samples: &[[u32; 3]], index: usize, width: usize, channel: usize) -> i32 {
    if index % width != 0 {
        samples[index - 1][channel] as i32
    } else if index >= width {
        samples[index - width][channel] as i32
    } else {
        0
    }
}

pub(crate) fn encode_colors(
    colors: &[[u8; 3]],
    bits: u8,
    coding: ColorCodingType,
    out: &mut Vec<u8>,
) {
    let quantized: Vec<[u32; 3]> = colors.iter().map(|c| c.map(|v| quantize(v, bits))).collect();
    match coding {
        ColorCodingType::Native => {
            let mut writer = BitWriter::new();
            for sample in &quantized {
                for &channel in sample {
                    writer.write(channel, bits);
                }
            }
            out.extend_from_slice(&writer.finish());
        }
        ColorCodingType::ImageBased => {
            let width = raster_width(quantized.len());
            write_varint(out, width as u32);
            // Runs of perfectly predicted samples collapse to a single count.
            let mut zero_run = 0u32;
            for index in 0..quantized.len() {
                let residuals: [i32; 3] = std::array::from_fn(|channel| {
                    quantized[index][channel] as i32 - predict(&quantized, index, width, channel)
                });
                if residuals == [0; 3] {
                    zero_run += 1;
                    continue;
                }
                write_varint(out, zero_run);
                zero_run = 0;
                for residual in residuals {
                    write_varint(out, zigzag(residual));
                }
            }
            if zero_run > 0 {
                write_varint(out, zero_run);
            }
        }
    }
}

pub(crate) fn decode_colors(
    layer: &[u8],
    count: usize,
    bits: u8,
    coding: ColorCodingType,
) -> Result<Vec<[u8; 3]>, CodecError> {
    let mut quantized: Vec<[u32; 3]> = Vec::with_capacity(count);
    match coding {
        ColorCodingType::Native => {
            let mut reader = BitReader::new(layer);
            for _ in 0..count {
                let mut sample = [0u32; 3];
                for channel in &mut sample {
                    *channel = reader.read(bits)?;
                }
                quantized.push(sample);
            }
        }
        ColorCodingType::ImageBased => {
            let mut cursor = 0;
            let width = read_varint(layer, &mut cursor)? as usize;
            if width == 0 {
                return Err(CodecError::Corrupt("zero raster width".into()));
            }
            let max = (1i32 << bits) - 1;
            while quantized.len() < count {
                let run = read_varint(layer, &mut cursor)? as usize;
                if run > count - quantized.len() {
                    return Err(CodecError::Corrupt(format!(
                        "zero run of {run} exceeds remaining {} samples",
                        count - quantized.len()
                    )));
                }
                for _ in 0..run {
                    let index = quantized.len();
                    let sample = std::array::from_fn(|channel| {
                        predict(&quantized, index, width, channel) as u32
                    });
                    quantized.push(sample);
                }
                if quantized.len() == count {
                    break;
                }

                let index = quantized.len();
                quantized.push([0; 3]);
                for channel in 0..3 {
                    let residual = unzigzag(read_varint(layer, &mut cursor)?);
                    let value = predict(&quantized, index, width, channel) + residual;
                    if !(0..=max).contains(&value) {
                        return Err(CodecError::Corrupt(format!(
                            "color sample {value} outside 0..={max}"
                        )));
                    }
                    quantized[index][channel] = value as u32;
                }
            }
            if cursor != layer.len() {
                return Err(CodecError::Corrupt("trailing bytes after color layer".into()));
            }
        }
    }
    Ok(quantized
        .into_iter()
        .map(|sample| sample.map(|v| dequantize(v, bits)))
        .collect())
}
