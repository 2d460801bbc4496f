//! 抠色模块
//!
//! 将叠加图中与键色完全相等的像素置为全透明，使底图在这些区域可见。
//!
//! # 设计思路
//!
//! - 算法纯函数化：输入为位图与键色，输出为新位图，输入不被修改。
//! - 只比较 RGB 三个通道，命中后仅把 alpha 写 0，RGB 字节保持原样；
//!   其余像素（含 alpha）逐字节不变。
//! - 严格相等，不做容差匹配。抗锯齿边缘的近白像素会保留为不透明，
//!   这是已知并被接受的表现。
//! - 单趟遍历，复杂度 O(width * height)。

use image::Rgb;

use super::source::RasterImage;

/// 默认键色：纯白背景。
pub const DEFAULT_KEY_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// 对位图执行抠色，返回新位图。
///
/// # 参数
/// * `image` - 输入位图，保持不变
/// * `key`   - 键色，RGB 三通道完全相等才算命中
///
/// # 返回
/// 抠色后的新位图，尺寸与来源标签与输入一致
pub fn apply_chroma_key(image: &RasterImage, key: Rgb<u8>) -> RasterImage {
    let mut data = image.as_rgba8().clone();

    for pixel in data.pixels_mut() {
        if pixel[0] == key[0] && pixel[1] == key[1] && pixel[2] == key[2] {
            pixel[3] = 0;
        }
    }

    RasterImage::new(image.label().to_string(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;
    use std::time::Instant;

    fn raster_from_pixels(width: u32, height: u32, pixels: &[[u8; 4]]) -> RasterImage {
        assert_eq!(pixels.len(), (width * height) as usize);
        let mut image = RgbaImage::new(width, height);
        for (index, pixel) in pixels.iter().enumerate() {
            let x = index as u32 % width;
            let y = index as u32 / width;
            image.put_pixel(x, y, Rgba(*pixel));
        }
        RasterImage::new("test".to_string(), image)
    }

    #[test]
    fn all_key_pixels_become_transparent_with_rgb_preserved() {
        let input = raster_from_pixels(2, 2, &[[255, 255, 255, 255]; 4]);

        let output = apply_chroma_key(&input, DEFAULT_KEY_COLOR);

        for pixel in output.as_rgba8().pixels() {
            assert_eq!(pixel.0, [255, 255, 255, 0]);
        }
    }

    #[test]
    fn image_without_key_pixels_is_unchanged() {
        let input = raster_from_pixels(
            2,
            2,
            &[
                [254, 255, 255, 255],
                [0, 0, 0, 255],
                [128, 64, 32, 17],
                [255, 255, 254, 0],
            ],
        );

        let output = apply_chroma_key(&input, DEFAULT_KEY_COLOR);

        assert_eq!(output.as_rgba8().as_raw(), input.as_rgba8().as_raw());
    }

    #[test]
    fn key_match_ignores_existing_alpha() {
        // 半透明的键色像素同样置 0，与逐像素规则保持一致
        let input = raster_from_pixels(1, 2, &[[255, 255, 255, 128], [255, 255, 255, 0]]);

        let output = apply_chroma_key(&input, DEFAULT_KEY_COLOR);

        assert_eq!(output.as_rgba8().get_pixel(0, 0).0, [255, 255, 255, 0]);
        assert_eq!(output.as_rgba8().get_pixel(0, 1).0, [255, 255, 255, 0]);
    }

    #[test]
    fn custom_key_color_is_respected() {
        let input = raster_from_pixels(1, 2, &[[0, 255, 0, 255], [255, 255, 255, 255]]);

        let output = apply_chroma_key(&input, Rgb([0, 255, 0]));

        assert_eq!(output.as_rgba8().get_pixel(0, 0).0, [0, 255, 0, 0]);
        assert_eq!(output.as_rgba8().get_pixel(0, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn input_raster_is_left_untouched() {
        let input = raster_from_pixels(1, 1, &[[255, 255, 255, 255]]);

        let _output = apply_chroma_key(&input, DEFAULT_KEY_COLOR);

        assert_eq!(input.as_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn perf_chroma_key_full_hd() {
        let mut image = RgbaImage::new(1920, 1080);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([(x % 255) as u8, (y % 255) as u8, 40, 255])
            };
        }
        let input = RasterImage::new("perf".to_string(), image);

        let start = Instant::now();
        let output = apply_chroma_key(&input, DEFAULT_KEY_COLOR);
        let elapsed = start.elapsed();

        println!(
            "[perf] chroma 1920x1080 elapsed={}ms",
            elapsed.as_millis()
        );

        let transparent = output
            .as_rgba8()
            .pixels()
            .filter(|pixel| pixel[3] == 0)
            .count();
        assert_eq!(transparent, (1920 * 1080) / 2);
    }

    fn rgba_buffer_strategy() -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
        (1u32..12, 1u32..12).prop_flat_map(|(width, height)| {
            prop::collection::vec(any::<u8>(), (width * height * 4) as usize)
                .prop_map(move |bytes| (width, height, bytes))
        })
    }

    proptest! {
        #[test]
        fn chroma_key_only_clears_alpha_of_key_pixels((width, height, bytes) in rgba_buffer_strategy()) {
            let image = RgbaImage::from_raw(width, height, bytes).expect("buffer length should match");
            let input = RasterImage::new("prop".to_string(), image);

            let output = apply_chroma_key(&input, DEFAULT_KEY_COLOR);

            for (before, after) in input.as_rgba8().pixels().zip(output.as_rgba8().pixels()) {
                if before[0] == 255 && before[1] == 255 && before[2] == 255 {
                    prop_assert_eq!(after.0, [before[0], before[1], before[2], 0]);
                } else {
                    prop_assert_eq!(after.0, before.0);
                }
            }
        }
    }
}
