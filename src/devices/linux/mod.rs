//! Hardware-backed drivers for a Raspberry Pi class board
//!
//! Everything goes through stock kernel interfaces (sysfs GPIO/PWM and
//! i2c-dev), so no vendor library is needed on the target.

pub mod hcsr04;
pub mod i2c;
pub mod l298n;
pub mod mpu6050;
pub mod sg90;
pub mod soft_pwm;
pub mod sysfs;

pub use hcsr04::Hcsr04;
pub use l298n::{L298nMotor, L298nPins};
pub use mpu6050::Mpu6050;
pub use sg90::{Sg90Pins, Sg90Servo};
