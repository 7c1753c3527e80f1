use embedded_time::duration::Microseconds;
use embedded_time::rate::Hertz;

use mtu2_pwm::cpg::Cpg;
use mtu2_pwm::gpio::{Rza1Pins, P4_4, P4_5, P8_11};
use mtu2_pwm::pwm::{Config, Mtu2};
use mtu2_pwm::reg::{Reg16, Reg8};
use mtu2_pwm::timer::Prescaler;

use testsuite::{mtu2, mtu2_clocked, FakeClock, FakeRegisters, Write};

#[test]
fn fast_clock_one_millisecond() {
    let (mtu2, registers) = mtu2_clocked(FakeClock(Hertz(66_666_000)));

    let _out = mtu2.pwm_out(P4_4).unwrap();
    mtu2.set_period_us(1_000);

    assert_eq!(mtu2.period_ticks(), 16_666);
    assert_eq!(mtu2.prescaler().bits(), 1);
    assert_eq!(mtu2.prescaler().shift(), 2);
    assert_eq!(registers.peek8(Reg8::Tcr3), 0x21);
    assert_eq!(registers.peek16(Reg16::Tgra3), 16_666);
    assert_eq!(registers.peek16(Reg16::Tgrc3), 16_666);
}

#[test]
fn reprogramming_order() {
    let (mtu2, registers) = mtu2();
    let _out = mtu2.pwm_out(P4_4).unwrap();
    registers.clear_log();

    mtu2.set_period_us(20_000);

    let writes = registers.writes();
    assert_eq!(writes.first(), Some(&Write::Byte(Reg8::Tstr, 0x00)));
    assert_eq!(writes.last(), Some(&Write::Byte(Reg8::Tstr, 0x40)));
    // 20 ms at 32 MHz needs P0φ/16
    assert_eq!(writes[1], Write::Byte(Reg8::Tcr3, 0x22));
    assert!(writes.contains(&Write::Half(Reg16::Tgra3, 40_000)));
    assert!(writes.contains(&Write::Half(Reg16::Tgrc3, 40_000)));

    let position = |write: Write| writes.iter().position(|w| *w == write).unwrap();
    assert!(position(Write::Half(Reg16::Tcnt3, 0)) < position(Write::Half(Reg16::Tgra3, 40_000)));
}

fn configuration_after(period_us: i32) -> (Vec<u8>, Vec<u16>, Microseconds) {
    let registers = FakeRegisters::new();
    let mtu2 = Mtu2::new(registers.clone(), Cpg::default(), Rza1Pins);
    let _out = mtu2.pwm_out(P4_4).unwrap();
    mtu2.set_period_us(period_us);
    let (bytes, halves) = registers.snapshot();
    (bytes, halves, mtu2.period())
}

#[test]
fn long_periods_clamp_to_two_seconds() {
    let clamped = configuration_after(3_000_000);
    assert_eq!(clamped, configuration_after(2_000_000));
    assert_eq!(clamped.2, Microseconds(2_000_000_u32));
}

#[test]
fn short_periods_clamp_to_one_microsecond() {
    let clamped = configuration_after(0);
    assert_eq!(clamped, configuration_after(1));
    assert_eq!(configuration_after(-40), clamped);
    assert_eq!(clamped.2, Microseconds(1_u32));
}

#[test]
fn slowest_prescaler_for_two_seconds() {
    let (mtu2, _) = mtu2_clocked(FakeClock(Cpg::CM0_P0_CLK));
    let _out = mtu2.pwm_out(P4_4).unwrap();

    mtu2.set_period_ms(2_000);

    assert_eq!(mtu2.prescaler(), Prescaler::DIV1024);
    assert_eq!(mtu2.period_ticks(), 65_104);
}

#[test]
fn unit_variants() {
    let (mtu2, _) = mtu2();
    let _out = mtu2.pwm_out(P4_4).unwrap();

    mtu2.set_period_ms(20);
    assert_eq!(mtu2.period(), Microseconds(20_000_u32));

    mtu2.set_period(0.5);
    assert_eq!(mtu2.period(), Microseconds(500_000_u32));
    assert_eq!(mtu2.period_ticks(), 62_500);
    assert_eq!(mtu2.prescaler().divider(), 256);

    mtu2.set_period_ms(i32::MAX);
    assert_eq!(mtu2.period(), Microseconds(2_000_000_u32));
}

#[test]
fn period_before_allocation_is_deferred() {
    let (mtu2, registers) = mtu2();

    mtu2.set_period_us(20_000);

    assert!(registers.writes().is_empty());
    assert_eq!(mtu2.period(), Microseconds(20_000_u32));
    assert_eq!(mtu2.period_ticks(), 0);

    let _out = mtu2.pwm_out(P4_4).unwrap();
    assert_eq!(mtu2.period_ticks(), 40_000);
    assert_eq!(registers.peek16(Reg16::Tgra3), 40_000);
}

#[test]
fn configured_period() {
    let registers = FakeRegisters::new();
    let config = Config::default().period(Microseconds(500_u32));
    let mtu2 = Mtu2::with_config(registers.clone(), Cpg::default(), Rza1Pins, config);

    let _out = mtu2.pwm_out(P4_4).unwrap();

    assert_eq!(mtu2.period(), Microseconds(500_u32));
    assert_eq!(registers.peek16(Reg16::Tgra3), 16_000);
}

#[test]
fn rescaling_keeps_duty_ratio() {
    let (mtu2, _) = mtu2_clocked(FakeClock(Hertz(66_666_000)));
    let mut a = mtu2.pwm_out(P4_4).unwrap();
    let mut b = mtu2.pwm_out(P4_5).unwrap();
    let mut c = mtu2.pwm_out(P8_11).unwrap();
    a.write(0.3);
    b.write(0.05);
    c.write(0.999);

    for &period_us in &[1_500, 20_000, 333, 1_999_999, 7, 1_000] {
        let before = [a.read(), b.read(), c.read()];
        mtu2.set_period_us(period_us);
        let after = [a.read(), b.read(), c.read()];
        // one tick, plus float slack
        let tolerance = 1.0 / f32::from(mtu2.period_ticks()) + 1e-6;

        for (before, after) in before.iter().zip(after.iter()) {
            assert!(
                (before - after).abs() <= tolerance,
                "{} us: {} -> {}",
                period_us,
                before,
                after
            );
        }
    }
}

#[test]
fn rescale_covers_unallocated_outputs() {
    let (mtu2, registers) = mtu2();
    let _out = mtu2.pwm_out(P4_4).unwrap();
    registers.poke16(Reg16::Tgrd4, 8_000);

    mtu2.set_period_us(2_000);

    assert_eq!(registers.peek16(Reg16::Tgrd4), 16_000);
}
