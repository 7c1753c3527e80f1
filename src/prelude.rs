//! Prelude

pub use crate::cpg::ClockSource as _mtu2_pwm_cpg_ClockSource;
pub use crate::gpio::PinMap as _mtu2_pwm_gpio_PinMap;
pub use crate::hal::prelude::*;
pub use crate::reg::Registers as _mtu2_pwm_reg_Registers;
pub use crate::timer::CounterExt as _mtu2_pwm_timer_CounterExt;
pub use crate::{
    hal::digital::v2::OutputPin as _embedded_hal_digital_OutputPin,
    hal::PwmPin as _embedded_hal_PwmPin,
};
