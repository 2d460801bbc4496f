//! 合成表面模块
//!
//! `CompositeSurface` 是叠加层的唯一绘制目标：一次选择周期内先 `reset`
//! 清空并对齐底图尺寸，再按顺序绘制若干图层。表面只负责像素累积，
//! 不感知图层因何而来；清空与绘制的时序由控制器保证。
//!
//! 绘制采用标准 source-over 透明度混合，超出表面的部分被裁剪。

use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, RgbaImage};

use super::source::RasterImage;
use super::OverlayError;

/// 叠加层合成表面。
///
/// 底图不绘制在这里，由嵌入方单独渲染；表面上只有当前选择对应的叠加图层。
#[derive(Debug, Default)]
pub struct CompositeSurface {
    canvas: RgbaImage,
}

impl CompositeSurface {
    /// 创建空表面（0x0，尚未对齐底图尺寸）。
    pub fn new() -> Self {
        Self {
            canvas: RgbaImage::new(0, 0),
        }
    }

    /// 清空表面并调整为指定尺寸。
    ///
    /// 调整后所有像素都是全透明，不保留上一周期的任何内容。
    pub fn reset(&mut self, width: u32, height: u32) {
        self.canvas = RgbaImage::new(width, height);
    }

    /// 以 source-over 混合在 `(x, y)` 处绘制一个图层。
    ///
    /// 图层的全透明像素不会覆盖已有内容；越界部分被裁剪。
    pub fn draw_layer(&mut self, layer: &RasterImage, x: i64, y: i64) {
        imageops::overlay(&mut self.canvas, layer.as_rgba8(), x, y);
    }

    /// 表面尺寸（宽、高）。
    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// 只读访问表面像素。
    pub fn as_image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// 判断表面是否全透明（即没有任何可见内容）。
    pub fn is_fully_transparent(&self) -> bool {
        self.canvas.pixels().all(|pixel| pixel[3] == 0)
    }

    /// 将表面编码为 PNG 字节，供落盘或外部展示。
    pub fn encode_png(&self) -> Result<Vec<u8>, OverlayError> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(self.canvas.clone())
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| OverlayError::Decode(format!("表面编码 PNG 失败：{}", e)))?;

        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid_raster(width: u32, height: u32, color: [u8; 4]) -> RasterImage {
        let mut image = RgbaImage::new(width, height);
        for pixel in image.pixels_mut() {
            *pixel = Rgba(color);
        }
        RasterImage::new("test".to_string(), image)
    }

    #[test]
    fn reset_clears_all_pixels_from_previous_cycle() {
        let mut surface = CompositeSurface::new();
        surface.reset(4, 4);
        surface.draw_layer(&solid_raster(4, 4, [200, 10, 10, 255]), 0, 0);
        assert!(!surface.is_fully_transparent());

        surface.reset(4, 4);

        assert!(surface.is_fully_transparent());
        assert_eq!(surface.dimensions(), (4, 4));
    }

    #[test]
    fn reset_resizes_surface() {
        let mut surface = CompositeSurface::new();
        assert_eq!(surface.dimensions(), (0, 0));

        surface.reset(16, 9);

        assert_eq!(surface.dimensions(), (16, 9));
        assert!(surface.is_fully_transparent());
    }

    #[test]
    fn opaque_layer_replaces_surface_pixels() {
        let mut surface = CompositeSurface::new();
        surface.reset(2, 2);
        surface.draw_layer(&solid_raster(2, 2, [0, 0, 255, 255]), 0, 0);

        surface.draw_layer(&solid_raster(2, 2, [255, 0, 0, 255]), 0, 0);

        for pixel in surface.as_image().pixels() {
            assert_eq!(pixel.0, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn transparent_layer_pixels_do_not_overwrite() {
        let mut surface = CompositeSurface::new();
        surface.reset(2, 1);
        surface.draw_layer(&solid_raster(2, 1, [0, 0, 255, 255]), 0, 0);

        let mut top = RgbaImage::new(2, 1);
        top.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        top.put_pixel(1, 0, Rgba([255, 0, 0, 0]));
        surface.draw_layer(&RasterImage::new("top".to_string(), top), 0, 0);

        assert_eq!(surface.as_image().get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(surface.as_image().get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn semi_transparent_layer_blends_source_over() {
        let mut surface = CompositeSurface::new();
        surface.reset(1, 1);
        surface.draw_layer(&solid_raster(1, 1, [0, 0, 255, 255]), 0, 0);

        surface.draw_layer(&solid_raster(1, 1, [255, 0, 0, 128]), 0, 0);

        let pixel = surface.as_image().get_pixel(0, 0);
        assert_eq!(pixel[3], 255);
        assert!(pixel[0] > 100 && pixel[0] < 160, "red = {}", pixel[0]);
        assert!(pixel[2] > 100 && pixel[2] < 160, "blue = {}", pixel[2]);
    }

    #[test]
    fn layer_drawn_with_offset_is_clipped() {
        let mut surface = CompositeSurface::new();
        surface.reset(4, 4);

        surface.draw_layer(&solid_raster(4, 4, [9, 9, 9, 255]), 2, 2);

        assert_eq!(surface.as_image().get_pixel(1, 1)[3], 0);
        assert_eq!(surface.as_image().get_pixel(2, 2).0, [9, 9, 9, 255]);
        assert_eq!(surface.as_image().get_pixel(3, 3).0, [9, 9, 9, 255]);
    }

    #[test]
    fn encode_png_round_trips_surface_pixels() {
        let mut surface = CompositeSurface::new();
        surface.reset(3, 3);
        surface.draw_layer(&solid_raster(3, 3, [12, 34, 56, 255]), 0, 0);

        let png = surface.encode_png().expect("surface should encode");
        let decoded = image::load_from_memory(&png)
            .expect("encoded surface should decode")
            .to_rgba8();

        assert_eq!(decoded.dimensions(), (3, 3));
        assert_eq!(decoded.get_pixel(1, 1).0, [12, 34, 56, 255]);
    }
}
