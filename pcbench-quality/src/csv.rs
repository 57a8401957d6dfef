//! CSV rendering of benchmark rows.

use crate::metric::QualityMetric;
use std::io::{self, Write};

/// Report columns after `compression_setting,frame,status`.
pub const CSV_COLUMNS: [&str; 18] = [
    "in_point_count",
    "out_point_count",
    "compressed_size",
    "bits_per_point",
    "mse_dist_a2b",
    "mse_dist_b2a",
    "symm_rms",
    "symm_hausdorff",
    "psnr_db_p2p",
    "psnr_colors_y",
    "psnr_colors_u",
    "psnr_colors_v",
    "encoding_time_ms",
    "decoding_time_ms",
    "byte_count_octree_layer",
    "byte_count_centroid_layer",
    "byte_count_color_layer",
    "error_message",
];

/// Keep a free-text message inside one unquoted cell.
fn sanitize_cell(message: &str) -> String {
    message
        .chars()
        .map(|c| match c {
            ',' => ';',
            '"' => '\'',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}

impl QualityMetric {
    pub fn print_csv_header(sink: &mut impl Write) -> io::Result<()> {
        writeln!(sink, "compression_setting,frame,status,{}", CSV_COLUMNS.join(","))
    }

    pub fn print_csv_line(&self, tag: &str, frame: usize, sink: &mut impl Write) -> io::Result<()> {
        writeln!(
            sink,
            "{tag},{frame},ok,{},{},{},{:.4},{:.9},{:.9},{:.9},{:.9},{:.4},{:.4},{:.4},{:.4},{:.3},{:.3},{},{},{},",
            self.in_point_count,
            self.out_point_count,
            self.compressed_size,
            self.bits_per_point,
            self.mse_dist_a2b,
            self.mse_dist_b2a,
            self.symm_rms,
            self.symm_hausdorff,
            self.psnr_db_p2p,
            self.psnr_colors_yuv[0],
            self.psnr_colors_yuv[1],
            self.psnr_colors_yuv[2],
            self.encoding_time_ms,
            self.decoding_time_ms,
            self.byte_count_octree_layer,
            self.byte_count_centroid_layer,
            self.byte_count_color_layer,
        )
    }

    /// Row for a frame that could not be evaluated; metric cells stay empty
    /// and the last cell carries the failure message.
    pub fn print_csv_error_line(
        tag: &str,
        frame: usize,
        kind: &str,
        message: &str,
        sink: &mut impl Write,
    ) -> io::Result<()> {
        writeln!(
            sink,
            "{tag},{frame},error:{kind}{}{}",
            ",".repeat(CSV_COLUMNS.len()),
            sanitize_cell(message)
        )
    }
}
