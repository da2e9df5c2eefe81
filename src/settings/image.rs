//! Terrain data from an RGB image.
//!
//! The image is stretched over the terrain square and its channels map
//! directly to factors: blue dominating red and green marks sea (darker blue
//! is deeper), otherwise green drives uplift and red drives slope. Painting
//! a terrain map is as simple as painting a picture.

use std::path::Path;

use image::RgbImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::geometry::Coordinate;
use crate::util::lerp;

use super::TerrainSettings;

/// Image-backed terrain data provider.
pub struct ImageSettings {
    size: i32,
    half_size: i32,
    lod: i32,
    seed: u64,
    rng: ChaCha8Rng,
    image: RgbImage,
}

impl ImageSettings {
    pub fn new(size: i32, lod: i32, seed: u64, image: RgbImage) -> Self {
        Self {
            size,
            half_size: size / 2,
            lod,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            image,
        }
    }

    /// Load the image at `path` and build a provider from it.
    pub fn open(
        size: i32,
        lod: i32,
        seed: u64,
        path: impl AsRef<Path>,
    ) -> Result<Self, image::ImageError> {
        let image = image::open(path)?.to_rgb8();
        Ok(Self::new(size, lod, seed, image))
    }

    /// Map a terrain x (in [-half, half]) to an image column.
    fn image_x(&self, x: f64) -> u32 {
        let t = ((x + self.half_size as f64) / self.size as f64).clamp(0.0, 1.0);
        let column = lerp(0.0, (self.image.width() - 1) as f64, t).round();
        (column as u32).min(self.image.width() - 1)
    }

    /// Map a terrain y to an image row. Row zero is the top of the image, so
    /// the axis flips.
    fn image_y(&self, y: f64) -> u32 {
        let t = ((y + self.half_size as f64) / self.size as f64).clamp(0.0, 1.0);
        let row = lerp((self.image.height() - 1) as f64, 0.0, t).round();
        (row as u32).min(self.image.height() - 1)
    }
}

impl TerrainSettings for ImageSettings {
    fn data(&self, x: f64, y: f64, max_size: i32) -> Coordinate {
        let pixel = self
            .image
            .get_pixel(self.image_x(x.round()), self.image_y(y.round()));
        let red = pixel[0] as f64;
        let green = pixel[1] as f64;
        let blue = pixel[2] as f64;

        let sea_factor = lerp(-1.0, 1.0, (255.0 - blue) / 255.0);
        if blue >= red.max(green) {
            Coordinate::clamped(x, y, max_size, sea_factor, 0.0, 0.0)
        } else {
            Coordinate::clamped(
                x,
                y,
                max_size,
                sea_factor,
                lerp(0.0, 1.0, green / 255.0),
                lerp(0.0, 1.0, red / 255.0),
            )
        }
    }

    fn size(&self) -> i32 {
        self.size
    }

    fn lod(&self) -> i32 {
        self.lod
    }

    fn seed(&self) -> u64 {
        self.seed
    }

    fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn settings_with(pixels: [[u8; 3]; 4]) -> ImageSettings {
        // 2x2 image: [0]=top-left, [1]=top-right, [2]=bottom-left,
        // [3]=bottom-right.
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb(pixels[0]));
        img.put_pixel(1, 0, Rgb(pixels[1]));
        img.put_pixel(0, 1, Rgb(pixels[2]));
        img.put_pixel(1, 1, Rgb(pixels[3]));
        ImageSettings::new(100, 16, 0, img)
    }

    #[test]
    fn dominant_blue_is_sea() {
        let s = settings_with([[0, 0, 255]; 4]);
        let c = s.data(0.0, 0.0, 0);
        assert!(c.is_sea());
        assert_eq!(c.sea_factor, -1.0);
        assert_eq!(c.uplift_factor, 0.0);
    }

    #[test]
    fn green_maps_to_uplift_and_red_to_slope() {
        let s = settings_with([[64, 128, 0]; 4]);
        let c = s.data(0.0, 0.0, 0);
        assert!(!c.is_sea());
        assert!((c.uplift_factor - 128.0 / 255.0).abs() < 1.0e-12);
        assert!((c.slope_factor - 64.0 / 255.0).abs() < 1.0e-12);
    }

    #[test]
    fn vertical_axis_is_flipped() {
        // Top row sea, bottom row land: positive y must read the top row.
        let s = settings_with([
            [0, 0, 255],
            [0, 0, 255],
            [0, 200, 0],
            [0, 200, 0],
        ]);
        assert!(s.data(0.0, 40.0, 0).is_sea());
        assert!(!s.data(0.0, -40.0, 0).is_sea());
    }
}
