//! Hashing and coherent noise on the CPU.
//!
//! The explosion scatter and hotspot marking need noise that is smooth in
//! space, so neighbouring particles drift together instead of flickering.

use glam::Vec3;

/// Integer hash (lowbias32 variant).
#[inline]
pub fn hash(n: u32) -> u32 {
    let mut x = n;
    x ^= x >> 17;
    x = x.wrapping_mul(0xed5a_d4bb);
    x ^= x >> 11;
    x = x.wrapping_mul(0xac4c_1b51);
    x ^= x >> 15;
    x = x.wrapping_mul(0x3184_8bab);
    x ^= x >> 14;
    x
}

/// Hash of a 3D lattice coordinate.
#[inline]
pub fn hash3(x: i32, y: i32, z: i32) -> u32 {
    hash((x as u32).wrapping_add(hash((y as u32).wrapping_add(hash(z as u32)))))
}

/// Float in `[0, 1)` from a seed.
#[inline]
pub fn rand01(seed: u32) -> f32 {
    (hash(seed) >> 8) as f32 / (1u32 << 24) as f32
}

const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

#[inline]
fn corner(i: i32, j: i32, k: i32, x: f32, y: f32, z: f32) -> f32 {
    let t = 0.6 - x * x - y * y - z * z;
    if t <= 0.0 {
        return 0.0;
    }
    let g = GRAD3[(hash3(i, j, k) % 12) as usize];
    let t2 = t * t;
    t2 * t2 * (g[0] * x + g[1] * y + g[2] * z)
}

/// 3D simplex noise, roughly in `[-1, 1]`.
pub fn simplex3(p: Vec3) -> f32 {
    const F3: f32 = 1.0 / 3.0;
    const G3: f32 = 1.0 / 6.0;

    let s = (p.x + p.y + p.z) * F3;
    let i = (p.x + s).floor();
    let j = (p.y + s).floor();
    let k = (p.z + s).floor();
    let t = (i + j + k) * G3;

    let x0 = p.x - (i - t);
    let y0 = p.y - (j - t);
    let z0 = p.z - (k - t);

    // Which simplex of the skewed cube we are in.
    let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
        if y0 >= z0 {
            (1, 0, 0, 1, 1, 0)
        } else if x0 >= z0 {
            (1, 0, 0, 1, 0, 1)
        } else {
            (0, 0, 1, 1, 0, 1)
        }
    } else if y0 < z0 {
        (0, 0, 1, 0, 1, 1)
    } else if x0 < z0 {
        (0, 1, 0, 0, 1, 1)
    } else {
        (0, 1, 0, 1, 1, 0)
    };

    let x1 = x0 - i1 as f32 + G3;
    let y1 = y0 - j1 as f32 + G3;
    let z1 = z0 - k1 as f32 + G3;
    let x2 = x0 - i2 as f32 + 2.0 * G3;
    let y2 = y0 - j2 as f32 + 2.0 * G3;
    let z2 = z0 - k2 as f32 + 2.0 * G3;
    let x3 = x0 - 1.0 + 3.0 * G3;
    let y3 = y0 - 1.0 + 3.0 * G3;
    let z3 = z0 - 1.0 + 3.0 * G3;

    let (ii, jj, kk) = (i as i32, j as i32, k as i32);
    let n = corner(ii, jj, kk, x0, y0, z0)
        + corner(ii + i1, jj + j1, kk + k1, x1, y1, z1)
        + corner(ii + i2, jj + j2, kk + k2, x2, y2, z2)
        + corner(ii + 1, jj + 1, kk + 1, x3, y3, z3);

    (32.0 * n).clamp(-1.0, 1.0)
}

/// Scatter direction for one particle during an explosion.
///
/// Outward from the base position, bent by three decorrelated noise samples.
/// Particles at the origin scatter along their noise vector alone.
pub fn scatter_direction(base: Vec3, time: f32) -> Vec3 {
    let outward = base.normalize_or_zero();
    let n = Vec3::new(
        simplex3(base * 0.2 + Vec3::splat(time * 0.1)),
        simplex3(Vec3::new(base.y, base.z, base.x)),
        simplex3(Vec3::new(base.z, base.x, base.y)),
    );
    outward + n
}
