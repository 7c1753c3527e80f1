use embedded_hal::PwmPin;

use mtu2_pwm::gpio::P4_4;
use mtu2_pwm::motor::{Direction, Motor};
use mtu2_pwm::reg::Reg16;

use testsuite::{mtu2, FakePin, FakePwm};

fn motor() -> (Motor<FakePin, FakePin, FakePwm>, FakePin, FakePin, FakePwm) {
    let in1 = FakePin::default();
    let in2 = FakePin::default();
    let pwm = FakePwm::new(32_000);
    let motor = Motor::new(in1.clone(), in2.clone(), pwm.clone()).unwrap();
    (motor, in1, in2, pwm)
}

#[test]
fn new_motor_is_stopped() {
    let (motor, in1, in2, pwm) = motor();

    assert_eq!(motor.direction(), Direction::Stopped);
    assert_eq!(in1.level(), Some(false));
    assert_eq!(in2.level(), Some(false));
    assert_eq!(pwm.get_duty(), 0);
}

#[test]
fn forward() {
    let (mut motor, in1, in2, pwm) = motor();

    motor.drive(i16::MAX).unwrap();

    assert_eq!(motor.direction(), Direction::Forward);
    assert_eq!(in1.level(), Some(false));
    assert_eq!(in2.level(), Some(true));
    assert_eq!(pwm.get_duty(), 32_000);
}

#[test]
fn reverse() {
    let (mut motor, in1, in2, pwm) = motor();

    motor.drive(-16_384).unwrap();

    assert_eq!(motor.direction(), Direction::Reverse);
    assert_eq!(in1.level(), Some(true));
    assert_eq!(in2.level(), Some(false));
    assert_eq!(pwm.get_duty(), 16_000);
}

#[test]
fn most_negative_speed_saturates() {
    let (mut motor, _, _, pwm) = motor();

    motor.drive(i16::MIN).unwrap();

    assert_eq!(pwm.get_duty(), 32_000);
}

#[test]
fn zero_speed_is_forward_with_no_duty() {
    let (mut motor, in1, in2, pwm) = motor();

    motor.drive(0).unwrap();

    assert_eq!(motor.direction(), Direction::Forward);
    assert_eq!((in1.level(), in2.level()), (Some(false), Some(true)));
    assert_eq!(pwm.get_duty(), 0);
}

#[test]
fn stop_after_drive() {
    let (mut motor, in1, in2, pwm) = motor();
    motor.drive(-500).unwrap();

    motor.stop().unwrap();

    assert_eq!(motor.direction(), Direction::Stopped);
    assert_eq!((in1.level(), in2.level()), (Some(false), Some(false)));
    assert_eq!(pwm.get_duty(), 0);
}

#[test]
fn on_reset_synchronized_output() {
    let (mtu2, registers) = mtu2();
    let out = mtu2.pwm_out(P4_4).unwrap();
    let mut motor = Motor::new(FakePin::default(), FakePin::default(), out).unwrap();

    motor.drive(i16::MAX).unwrap();
    assert_eq!(registers.peek16(Reg16::Tgrc4), 31_999);

    motor.drive(-(i16::MAX / 2)).unwrap();
    assert_eq!(registers.peek16(Reg16::Tgrc4), 15_999);

    let (_, _, out) = motor.release();
    drop(out);
    assert_eq!(registers.peek16(Reg16::Tgrc4), 0);
}
