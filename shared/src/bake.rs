//! CPU environment bake.
//!
//! The sky is evaluated into an offscreen cube map, then prefiltered into the
//! two textures an image-based light needs: a specular cube carrying a full
//! box-filtered mip chain, which the renderer walks by roughness, and a
//! cosine-convolved irradiance cube at a fraction of the resolution.
//! Texels are packed as shared-exponent `rgb9e5` so the result can be
//! uploaded as a filterable HDR texture without a half-float dependency.

use bevy::math::Vec3;

use crate::sky::SkyModel;

pub const FACE_COUNT: usize = 6;

/// Irradiance cube edge length relative to the specular one.
pub const IRRADIANCE_DIVISOR: u32 = 8;
pub const MIN_IRRADIANCE_SIZE: u32 = 2;
/// Upper bound on the specular cube edge length, whatever was requested.
pub const MAX_BAKE_RESOLUTION: u32 = 1024;

const RGB9E5_MANTISSA_BITS: i32 = 9;
const RGB9E5_EXP_BIAS: i32 = 15;
const RGB9E5_MAX_EXP: i32 = 31;
const RGB9E5_MANTISSA_VALUES: i32 = 1 << RGB9E5_MANTISSA_BITS;
const RGB9E5_MAX: f32 = (RGB9E5_MANTISSA_VALUES - 1) as f32 / RGB9E5_MANTISSA_VALUES as f32
    * (1u32 << (RGB9E5_MAX_EXP - RGB9E5_EXP_BIAS)) as f32;

/// Cube faces in texture layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; FACE_COUNT] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Direction through the face at `(u, v)` in `[-1, 1]`, `v` growing downwards,
    /// expressed in cube-map space.
    pub fn cube_direction(self, u: f32, v: f32) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::new(1.0, -v, -u),
            CubeFace::NegativeX => Vec3::new(-1.0, -v, u),
            CubeFace::PositiveY => Vec3::new(u, 1.0, v),
            CubeFace::NegativeY => Vec3::new(u, -1.0, -v),
            CubeFace::PositiveZ => Vec3::new(u, -v, 1.0),
            CubeFace::NegativeZ => Vec3::new(-u, -v, -1.0),
        }
        .normalize()
    }

    /// Same as [`CubeFace::cube_direction`], in the right-handed world frame.
    /// The renderer samples cube maps left-handed, hence the flipped Z.
    pub fn world_direction(self, u: f32, v: f32) -> Vec3 {
        let dir = self.cube_direction(u, v);
        Vec3::new(dir.x, dir.y, -dir.z)
    }
}

/// Texel centre of `index` on a face of `size` texels, mapped to `[-1, 1]`.
fn texel_coordinate(index: u32, size: u32) -> f32 {
    2.0 * (index as f32 + 0.5) / size as f32 - 1.0
}

/// Solid angle covered by the texel at `(u, v)`, up to a constant factor.
fn texel_solid_angle(u: f32, v: f32) -> f32 {
    (1.0 + u * u + v * v).powf(-1.5)
}

/// Six square faces of linear RGB, face-major then row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeRadiance {
    pub size: u32,
    pub texels: Vec<Vec3>,
}

impl CubeRadiance {
    pub fn from_fn(size: u32, mut radiance: impl FnMut(Vec3) -> Vec3) -> Self {
        let size = size.max(1);
        let mut texels = Vec::with_capacity(FACE_COUNT * (size * size) as usize);
        for face in CubeFace::ALL {
            for y in 0..size {
                let v = texel_coordinate(y, size);
                for x in 0..size {
                    let u = texel_coordinate(x, size);
                    texels.push(radiance(face.world_direction(u, v)));
                }
            }
        }
        Self { size, texels }
    }

    pub fn texel(&self, face: usize, x: u32, y: u32) -> Vec3 {
        let size = self.size as usize;
        self.texels[face * size * size + y as usize * size + x as usize]
    }

    /// Box-filters every face down to `size` texels.
    pub fn downsample(&self, size: u32) -> Self {
        let size = size.clamp(1, self.size);
        let ratio = self.size / size;
        let mut texels = Vec::with_capacity(FACE_COUNT * (size * size) as usize);
        for face in 0..FACE_COUNT {
            for y in 0..size {
                for x in 0..size {
                    let mut sum = Vec3::ZERO;
                    for sy in 0..ratio {
                        for sx in 0..ratio {
                            sum += self.texel(face, x * ratio + sx, y * ratio + sy);
                        }
                    }
                    texels.push(sum / (ratio * ratio) as f32);
                }
            }
        }
        Self { size, texels }
    }

    /// Cosine-weighted convolution: outgoing diffuse radiance for each normal.
    pub fn irradiance(&self, size: u32) -> Self {
        let samples: Vec<(Vec3, f32, Vec3)> = CubeFace::ALL
            .iter()
            .enumerate()
            .flat_map(|(face_index, face)| {
                (0..self.size).flat_map(move |y| {
                    (0..self.size).map(move |x| (face_index, *face, x, y))
                })
            })
            .map(|(face_index, face, x, y)| {
                let u = texel_coordinate(x, self.size);
                let v = texel_coordinate(y, self.size);
                (
                    face.world_direction(u, v),
                    texel_solid_angle(u, v),
                    self.texel(face_index, x, y),
                )
            })
            .collect();

        Self::from_fn(size, |normal| {
            let mut sum = Vec3::ZERO;
            let mut weight = 0.0;
            for &(direction, solid_angle, radiance) in &samples {
                let cos = normal.dot(direction);
                if cos > 0.0 {
                    sum += radiance * cos * solid_angle;
                    weight += cos * solid_angle;
                }
            }
            if weight > 0.0 {
                sum / weight
            } else {
                Vec3::ZERO
            }
        })
    }

    /// This cube followed by every 2x2 box reduction of it, down to 1 texel.
    pub fn mip_chain(&self) -> Vec<Self> {
        let mut chain = vec![self.clone()];
        while let Some(last) = chain.last() {
            if last.size <= 1 {
                break;
            }
            let next = last.downsample(last.size / 2);
            chain.push(next);
        }
        chain
    }

    pub fn to_rgb9e5(&self) -> PackedCube {
        PackedCube::from_mips(std::slice::from_ref(self))
    }
}

/// Cube map ready for upload: `rgb9e5` texels, layer-major, each face holding
/// its mips from largest to smallest.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedCube {
    pub size: u32,
    pub mip_level_count: u32,
    pub texels: Vec<u32>,
}

impl PackedCube {
    /// Packs `mips`, largest first, each level half the size of the previous.
    pub fn from_mips(mips: &[CubeRadiance]) -> Self {
        let mut texels = Vec::with_capacity(mips.iter().map(|m| m.texels.len()).sum());
        for face in 0..FACE_COUNT {
            for mip in mips {
                let face_len = (mip.size * mip.size) as usize;
                let start = face * face_len;
                texels.extend(
                    mip.texels[start..start + face_len]
                        .iter()
                        .map(|t| encode_rgb9e5(*t)),
                );
            }
        }
        Self {
            size: mips.first().map_or(0, |m| m.size),
            mip_level_count: mips.len() as u32,
            texels,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.texels.iter().flat_map(|t| t.to_le_bytes()).collect()
    }
}

/// Result of one environment bake.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentBake {
    pub specular: PackedCube,
    pub diffuse: PackedCube,
}

/// Edge length actually baked for a requested `size`: clamped, then rounded
/// up to a power of two so the box filters divide evenly.
pub fn bake_size(size: u32) -> u32 {
    size.clamp(MIN_IRRADIANCE_SIZE, MAX_BAKE_RESOLUTION)
        .next_power_of_two()
}

/// Renders `sky` into a cube of [`bake_size`] texels and prefilters it.
pub fn bake_environment(sky: &SkyModel, size: u32) -> EnvironmentBake {
    let radiance = CubeRadiance::from_fn(bake_size(size), |dir| sky.radiance(dir));
    let irradiance_size = (radiance.size / IRRADIANCE_DIVISOR).max(MIN_IRRADIANCE_SIZE);
    let source = radiance.downsample(irradiance_size.max(radiance.size / 4).max(1));
    let irradiance = source.irradiance(irradiance_size);

    EnvironmentBake {
        specular: PackedCube::from_mips(&radiance.mip_chain()),
        diffuse: irradiance.to_rgb9e5(),
    }
}

pub fn encode_rgb9e5(rgb: Vec3) -> u32 {
    let clamp = |c: f32| {
        if c.is_finite() {
            c.clamp(0.0, RGB9E5_MAX)
        } else {
            0.0
        }
    };
    let r = clamp(rgb.x);
    let g = clamp(rgb.y);
    let b = clamp(rgb.z);
    let max = r.max(g).max(b);

    let mut exp_shared =
        (-RGB9E5_EXP_BIAS - 1).max(max.log2().floor() as i32) + 1 + RGB9E5_EXP_BIAS;
    let mut denom = 2f32.powi(exp_shared - RGB9E5_EXP_BIAS - RGB9E5_MANTISSA_BITS);
    if (max / denom + 0.5).floor() as i32 == RGB9E5_MANTISSA_VALUES {
        exp_shared += 1;
        denom *= 2.0;
    }

    let r = (r / denom + 0.5).floor() as u32;
    let g = (g / denom + 0.5).floor() as u32;
    let b = (b / denom + 0.5).floor() as u32;
    r | (g << 9) | (b << 18) | ((exp_shared as u32) << 27)
}

pub fn decode_rgb9e5(packed: u32) -> Vec3 {
    let exp = (packed >> 27) as i32 - RGB9E5_EXP_BIAS - RGB9E5_MANTISSA_BITS;
    let scale = 2f32.powi(exp);
    Vec3::new(
        (packed & 0x1ff) as f32 * scale,
        ((packed >> 9) & 0x1ff) as f32 * scale,
        ((packed >> 18) & 0x1ff) as f32 * scale,
    )
}

/// Owner of the bake currently bound to the scene.
///
/// The previous target must be handed out with [`BakeSlot::retire`] and
/// disposed of before the next one is installed.
#[derive(Debug, Clone)]
pub struct BakeSlot<H> {
    current: Option<H>,
    generation: u64,
}

impl<H> Default for BakeSlot<H> {
    fn default() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }
}

impl<H> BakeSlot<H> {
    pub fn retire(&mut self) -> Option<H> {
        self.current.take()
    }

    pub fn install(&mut self, target: H) {
        debug_assert!(self.current.is_none(), "previous bake was not retired");
        self.current = Some(target);
        self.generation += 1;
    }

    pub fn current(&self) -> Option<&H> {
        self.current.as_ref()
    }

    /// Number of bakes installed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::sun_direction;
    use crate::sky::SkyParameters;

    #[test]
    fn test_rgb9e5_zero_and_one() {
        assert_eq!(decode_rgb9e5(encode_rgb9e5(Vec3::ZERO)), Vec3::ZERO);
        let one = decode_rgb9e5(encode_rgb9e5(Vec3::ONE));
        assert!((one - Vec3::ONE).length() < 1e-3);
    }

    #[test]
    fn test_rgb9e5_keeps_relative_precision_of_the_brightest_channel() {
        let sky_blue = Vec3::new(0.12, 0.31, 0.87);
        let decoded = decode_rgb9e5(encode_rgb9e5(sky_blue));
        assert!((decoded.z - sky_blue.z).abs() / sky_blue.z < 4e-3);
        assert!((decoded.y - sky_blue.y).abs() < 4e-3);
    }

    #[test]
    fn test_rgb9e5_clamps_out_of_range() {
        let decoded = decode_rgb9e5(encode_rgb9e5(Vec3::new(-1.0, f32::NAN, 1e9)));
        assert_eq!(decoded.x, 0.0);
        assert_eq!(decoded.y, 0.0);
        assert!((decoded.z - RGB9E5_MAX).abs() < 1.0);
    }

    #[test]
    fn test_face_centres_point_along_axes() {
        let expected = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
        for (face, axis) in CubeFace::ALL.iter().zip(expected) {
            assert!((face.cube_direction(0.0, 0.0) - axis).length() < 1e-6);
        }
        assert!((CubeFace::PositiveZ.world_direction(0.0, 0.0) - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_downsample_of_constant_cube_is_constant() {
        let cube = CubeRadiance::from_fn(8, |_| Vec3::splat(0.5));
        let small = cube.downsample(2);
        assert_eq!(small.size, 2);
        assert_eq!(small.texels.len(), 6 * 4);
        assert!(small.texels.iter().all(|t| (*t - Vec3::splat(0.5)).length() < 1e-6));
    }

    #[test]
    fn test_irradiance_of_constant_sky_is_that_constant() {
        let cube = CubeRadiance::from_fn(4, |_| Vec3::new(0.2, 0.4, 0.8));
        let irradiance = cube.irradiance(2);
        for texel in irradiance.texels {
            assert!((texel - Vec3::new(0.2, 0.4, 0.8)).length() < 1e-4);
        }
    }

    #[test]
    fn test_irradiance_favours_the_lit_hemisphere() {
        let cube = CubeRadiance::from_fn(8, |dir| Vec3::splat(dir.y.max(0.0)));
        let irradiance = cube.irradiance(2);
        let up = irradiance.texel(2, 0, 0);
        let down = irradiance.texel(3, 0, 0);
        assert!(up.x > down.x);
    }

    #[test]
    fn test_bake_sizes() {
        let sky = crate::sky::SkyModel::new(&SkyParameters::default(), sun_direction(30.0, 45.0));
        let bake = bake_environment(&sky, 8);
        assert_eq!(bake.specular.size, 8);
        assert_eq!(bake.specular.mip_level_count, 4);
        assert_eq!(bake.specular.texels.len(), 6 * (64 + 16 + 4 + 1));
        assert_eq!(bake.diffuse.mip_level_count, 1);
        assert_eq!(bake.diffuse.size, MIN_IRRADIANCE_SIZE);
        assert_eq!(bake.diffuse.to_bytes().len(), 6 * 4 * 4);
        assert_eq!(bake_environment(&sky, 5).specular.size, 8);
    }

    #[test]
    fn test_bake_size_is_clamped() {
        assert_eq!(bake_size(0), MIN_IRRADIANCE_SIZE);
        assert_eq!(bake_size(64), 64);
        assert_eq!(bake_size(600), MAX_BAKE_RESOLUTION);
        assert_eq!(bake_size(8192), MAX_BAKE_RESOLUTION);
        assert_eq!(bake_size(u32::MAX), MAX_BAKE_RESOLUTION);
    }

    #[test]
    fn test_mip_chain_halves_down_to_one_texel() {
        let cube = CubeRadiance::from_fn(16, |dir| dir.abs());
        let chain = cube.mip_chain();
        assert_eq!(chain.len() as u32, 16u32.ilog2() + 1);
        let sizes: Vec<u32> = chain.iter().map(|m| m.size).collect();
        assert_eq!(sizes, vec![16, 8, 4, 2, 1]);
        assert_eq!(chain[0], cube);
    }

    #[test]
    fn test_each_mip_texel_averages_its_parent_block() {
        let cube = CubeRadiance::from_fn(8, |dir| Vec3::new(dir.x.max(0.0), dir.y.abs(), 1.0));
        let chain = cube.mip_chain();
        for pair in chain.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            for face in 0..FACE_COUNT {
                for y in 0..child.size {
                    for x in 0..child.size {
                        let average = (parent.texel(face, 2 * x, 2 * y)
                            + parent.texel(face, 2 * x + 1, 2 * y)
                            + parent.texel(face, 2 * x, 2 * y + 1)
                            + parent.texel(face, 2 * x + 1, 2 * y + 1))
                            / 4.0;
                        assert!((child.texel(face, x, y) - average).length() < 1e-5);
                    }
                }
            }
        }
    }

    #[test]
    fn test_packed_mips_are_layer_major() {
        let cube = CubeRadiance::from_fn(2, |dir| {
            if dir.x > 0.5 {
                Vec3::X
            } else {
                Vec3::Y
            }
        });
        let packed = PackedCube::from_mips(&cube.mip_chain());
        assert_eq!(packed.mip_level_count, 2);
        // Face +X: four full-size texels, then its single 1x1 mip.
        let face_len = 4 + 1;
        assert_eq!(packed.texels.len(), FACE_COUNT * face_len);
        let face_x: Vec<Vec3> = packed.texels[..face_len]
            .iter()
            .map(|t| decode_rgb9e5(*t))
            .collect();
        let face_y = decode_rgb9e5(packed.texels[2 * face_len]);
        assert!(face_x.iter().all(|t| (*t - Vec3::X).length() < 1e-3));
        assert!((face_y - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn test_slot_retires_before_install() {
        let mut slot = BakeSlot::<u32>::default();
        assert_eq!(slot.retire(), None);
        slot.install(1);
        assert_eq!(slot.generation(), 1);
        assert_eq!(slot.retire(), Some(1));
        assert_eq!(slot.current(), None);
        slot.install(2);
        assert_eq!(slot.current(), Some(&2));
        assert_eq!(slot.generation(), 2);
    }
}
