use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::Point;

const DEGENERATE_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformError {
    Degenerate { determinant: f64 },
    NonFinite,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Degenerate { determinant } => {
                write!(f, "transform would become singular (determinant {determinant})")
            }
            TransformError::NonFinite => write!(f, "transform coefficients must be finite"),
        }
    }
}

impl std::error::Error for TransformError {}

/// 2D affine map stored in canvas order `[a, b, c, d, e, f]`:
///
/// ```text
/// | a  c  e |
/// | b  d  f |
/// | 0  0  1 |
/// ```
///
/// Every mutation keeps `a*d - b*c` away from zero; a rejected mutation
/// leaves the matrix untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn from_array(matrix: [f64; 6]) -> Result<Self, TransformError> {
        let [a, b, c, d, e, f] = matrix;
        let candidate = Self { a, b, c, d, e, f };
        candidate.validate()?;
        Ok(candidate)
    }

    pub fn get(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    pub fn set(&mut self, matrix: [f64; 6]) -> Result<(), TransformError> {
        *self = Self::from_array(matrix)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Post-multiplies a translation, so `(dx, dy)` is expressed in the
    /// current (already scaled) coordinate space.
    pub fn translate(&mut self, dx: f64, dy: f64) -> Result<(), TransformError> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(TransformError::NonFinite);
        }
        let e = self.e + self.a * dx + self.c * dy;
        let f = self.f + self.b * dx + self.d * dy;
        self.commit(Self { e, f, ..*self })
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> Result<(), TransformError> {
        if !sx.is_finite() || !sy.is_finite() {
            return Err(TransformError::NonFinite);
        }
        self.commit(Self {
            a: self.a * sx,
            b: self.b * sx,
            c: self.c * sy,
            d: self.d * sy,
            ..*self
        })
    }

    /// `self · other`: maps through `other` first, then `self`.
    pub fn concat(&self, other: &AffineTransform) -> AffineTransform {
        AffineTransform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn inverse(&self) -> AffineTransform {
        let det = self.determinant();
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        AffineTransform {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point {
            x: self.a * point.x + self.c * point.y + self.e,
            y: self.b * point.x + self.d * point.y + self.f,
        }
    }

    pub fn apply_inverse(&self, point: Point) -> Point {
        self.inverse().apply(point)
    }

    /// Maps a displacement through the inverse linear part only.
    pub fn inverse_vector(&self, dx: f64, dy: f64) -> (f64, f64) {
        let det = self.determinant();
        ((self.d * dx - self.c * dy) / det, (self.a * dy - self.b * dx) / det)
    }

    pub fn approx_eq(&self, other: &AffineTransform, epsilon: f64) -> bool {
        self.get()
            .iter()
            .zip(other.get().iter())
            .all(|(lhs, rhs)| (lhs - rhs).abs() <= epsilon)
    }

    fn validate(&self) -> Result<(), TransformError> {
        if !self.get().iter().all(|value| value.is_finite()) {
            return Err(TransformError::NonFinite);
        }
        let determinant = self.determinant();
        if !determinant.is_finite() {
            return Err(TransformError::NonFinite);
        }
        if determinant.abs() < DEGENERATE_EPSILON {
            return Err(TransformError::Degenerate { determinant });
        }
        Ok(())
    }

    fn commit(&mut self, candidate: AffineTransform) -> Result<(), TransformError> {
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}

/// Shared owner of the view transform. The zoom controller mutates it, the
/// selector reads it to map pointer positions; both hold a clone of the
/// handle.
#[derive(Clone, Debug, Default)]
pub struct TransformHandle {
    inner: Rc<RefCell<AffineTransform>>,
}

impl TransformHandle {
    pub fn new(transform: AffineTransform) -> Self {
        Self {
            inner: Rc::new(RefCell::new(transform)),
        }
    }

    pub fn get(&self) -> AffineTransform {
        *self.inner.borrow()
    }

    pub fn set(&self, matrix: [f64; 6]) -> Result<(), TransformError> {
        let transform = AffineTransform::from_array(matrix)?;
        *self.inner.borrow_mut() = transform;
        Ok(())
    }

    pub fn reset(&self) {
        self.inner.borrow_mut().reset();
    }

    /// Fetch, mutate a copy, push back. Nothing is written when `edit` fails,
    /// so a multi-step edit is all or nothing.
    pub fn update<F>(&self, edit: F) -> Result<AffineTransform, TransformError>
    where
        F: FnOnce(&mut AffineTransform) -> Result<(), TransformError>,
    {
        let mut working = self.get();
        edit(&mut working)?;
        *self.inner.borrow_mut() = working;
        Ok(working)
    }
}
