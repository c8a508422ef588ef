/// Inverse of a row-major 3x3 matrix by cofactor expansion.
///
/// A singular (or near-singular) input yields non-finite entries rather
/// than an error; callers must keep degenerate triangles out of the solve.
pub fn invert3x3(m: [f64; 9]) -> [f64; 9] {
    let [a, b, c, d, e, f, g, h, i] = m;
    let det =
        1.0 / (a * e * i + b * f * g + c * d * h - c * e * g - b * d * i - a * f * h);
    [
        (e * i - f * h) * det,
        -(b * i - c * h) * det,
        (b * f - c * e) * det,
        -(d * i - f * g) * det,
        (a * i - c * g) * det,
        -(a * f - c * d) * det,
        (d * h - e * g) * det,
        -(a * h - b * g) * det,
        (a * e - b * d) * det,
    ]
}

/// Inverse of a row-major 4x4 matrix, by the 2x2-minor expansion.
///
/// Not needed by the warp/rotate pipeline; kept as a general utility.
pub fn invert4x4(m: [f64; 16]) -> [f64; 16] {
    let [a, b, c, d, e, f, g, h, i, j, k, l, mm, n, o, p] = m;
    let q = a * f - b * e;
    let r = a * g - c * e;
    let s = a * h - d * e;
    let t = b * g - c * f;
    let u = b * h - d * f;
    let v = c * h - d * g;
    let w = i * n - j * mm;
    let x = i * o - k * mm;
    let y = i * p - l * mm;
    let z = j * o - k * n;
    let aa = j * p - l * n;
    let bb = k * p - l * o;
    let det = 1.0 / (q * bb - r * aa + s * z + t * y - u * x + v * w);
    [
        (f * bb - g * aa + h * z) * det,
        (-b * bb + c * aa - d * z) * det,
        (n * v - o * u + p * t) * det,
        (-j * v + k * u - l * t) * det,
        (-e * bb + g * y - h * x) * det,
        (a * bb - c * y + d * x) * det,
        (-mm * v + o * s - p * r) * det,
        (i * v - k * s + l * r) * det,
        (e * aa - f * y + h * w) * det,
        (-a * aa + b * y - d * w) * det,
        (mm * u - n * s + p * q) * det,
        (-i * u + j * s - l * q) * det,
        (-e * z + f * x - g * w) * det,
        (a * z - b * x + c * w) * det,
        (-mm * t + n * r - o * q) * det,
        (i * t - j * r + k * q) * det,
    ]
}
