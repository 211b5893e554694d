/*!
    Rational numbers for time bases and frame rates.
*/

use std::fmt;

/**
    A rational number, used for time bases and frame rates.

    A time base of `1/90000` means one timestamp tick is 1/90000th of a second.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Returns the value as a float. A zero denominator yields `0.0`.
    */
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    /**
        Returns the inverse (`den/num`), e.g. a frame rate from a time base.
    */
    pub const fn invert(self) -> Self {
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /**
        Returns true when the denominator is non-zero.
    */
    pub const fn is_valid(self) -> bool {
        self.den != 0
    }

    /**
        Reduce `num/den` to lowest terms with both terms bounded by `max`.

        When the exact fraction does not fit, the closest continued-fraction
        convergent within the bound is returned. The sign ends up on the
        numerator and `0/0` reduces to `0/1`.
    */
    pub fn reduce(num: i64, den: i64, max: i64) -> Self {
        let negative = (num < 0) != (den < 0);
        let mut num = num.unsigned_abs() as i128;
        let mut den = den.unsigned_abs() as i128;
        let max = max.clamp(1, i32::MAX as i64) as i128;

        let divisor = gcd(num, den);
        if divisor != 0 {
            num /= divisor;
            den /= divisor;
        }

        // Convergents a0 and a1 of the continued fraction expansion.
        let (mut a0_num, mut a0_den) = (0i128, 1i128);
        let (mut a1_num, mut a1_den) = (1i128, 0i128);

        if num <= max && den <= max {
            a1_num = num;
            a1_den = den;
            den = 0;
        }

        while den != 0 {
            let x = num / den;
            let next_den = num - den * x;
            let a2_num = x * a1_num + a0_num;
            let a2_den = x * a1_den + a0_den;

            if a2_num > max || a2_den > max {
                // Best semi-convergent that still fits.
                let mut x = if a1_num != 0 { (max - a0_num) / a1_num } else { x };
                if a1_den != 0 {
                    x = x.min((max - a0_den) / a1_den);
                }
                if den * (2 * x * a1_den + a0_den) > num * a1_den {
                    a1_num = x * a1_num + a0_num;
                    a1_den = x * a1_den + a0_den;
                }
                break;
            }

            a0_num = a1_num;
            a0_den = a1_den;
            a1_num = a2_num;
            a1_den = a2_den;
            num = den;
            den = next_den;
        }

        if a1_den == 0 {
            a1_den = 1;
        }

        let num = if negative { -a1_num } else { a1_num };
        Self {
            num: num as i32,
            den: a1_den as i32,
        }
    }

    /**
        Rescale a timestamp from this time base into `to`, rounding toward zero.
    */
    pub fn rescale(self, ts: i64, to: Rational) -> i64 {
        if self == to {
            return ts;
        }
        let num = ts as i128 * self.num as i128 * to.den as i128;
        let den = self.den as i128 * to.num as i128;
        if den == 0 {
            return 0;
        }
        (num / den) as i64
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self { num: 0, den: 1 }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: i64 = i32::MAX as i64;

    #[test]
    fn reduce_to_lowest_terms() {
        assert_eq!(Rational::reduce(2, 60, MAX), Rational::new(1, 30));
        assert_eq!(Rational::reduce(1001, 60000, MAX), Rational::new(1001, 60000));
        assert_eq!(Rational::reduce(48000, 48000, MAX), Rational::new(1, 1));
    }

    #[test]
    fn reduce_keeps_sign_on_numerator() {
        assert_eq!(Rational::reduce(-2, 4, MAX), Rational::new(-1, 2));
        assert_eq!(Rational::reduce(2, -4, MAX), Rational::new(-1, 2));
        assert_eq!(Rational::reduce(-2, -4, MAX), Rational::new(1, 2));
    }

    #[test]
    fn reduce_approximates_within_bound() {
        // 1/3 is the best approximation of 333/1000 with terms <= 10
        assert_eq!(Rational::reduce(333, 1000, 10), Rational::new(1, 3));
        // Both terms are bounded: 355/113 needs 355, so 200 gives a semi-convergent
        assert_eq!(Rational::reduce(355, 113, 400), Rational::new(355, 113));
        assert_eq!(Rational::reduce(355, 113, 200), Rational::new(179, 57));
        assert_eq!(Rational::reduce(355, 113, 100), Rational::new(22, 7));
    }

    #[test]
    fn reduce_zero() {
        assert_eq!(Rational::reduce(0, 25, MAX), Rational::new(0, 1));
        assert_eq!(Rational::reduce(0, 0, MAX), Rational::new(0, 1));
    }

    #[test]
    fn rescale_between_time_bases() {
        let ms = Rational::new(1, 1000);
        let mpeg = Rational::new(1, 90000);
        assert_eq!(ms.rescale(1000, mpeg), 90000);
        assert_eq!(mpeg.rescale(45000, ms), 500);
        assert_eq!(ms.rescale(42, ms), 42);
    }

    #[test]
    fn to_f64_and_invert() {
        let tb = Rational::new(1, 25);
        assert_eq!(tb.to_f64(), 0.04);
        assert_eq!(tb.invert(), Rational::new(25, 1));
        assert_eq!(Rational::new(1, 0).to_f64(), 0.0);
        assert!(!Rational::new(1, 0).is_valid());
    }
}
