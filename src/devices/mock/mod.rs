//! Simulated devices for hardware-free operation
//!
//! | Capability | Simulation |
//! |------------|------------|
//! | Distance (HC-SR04) | Uniform random distance, 2 decimals |
//! | IMU (MPU-6050) | Level sensor with uniform jitter, same tilt math as hardware |
//! | Servo (SG90) | Clamp + settle delay, remembers angle |
//! | DC motor (L298N) | In-memory state machine, brake delay |
//!
//! All randomness comes from one seeded [`NoiseGenerator`]; set
//! `[simulation] random_seed` to a non-zero value for reproducible runs.

pub mod imu;
pub mod motor;
pub mod noise;
pub mod servo;
pub mod ultrasonic;

pub use imu::MockImu;
pub use motor::MockMotor;
pub use noise::NoiseGenerator;
pub use servo::MockServo;
pub use ultrasonic::MockUltrasonic;
