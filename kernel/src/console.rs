//! Console output and the kernel logger, both over the SBI console

use crate::sbi;
use core::fmt::{self, Write};
use log::{Level, Metadata, Record};

struct Stdout;

impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            sbi::console_putchar(byte);
        }
        Ok(())
    }
}

pub fn print(args: fmt::Arguments) {
    let _ = Stdout.write_fmt(args);
}

/// Print to console
#[macro_export]
macro_rules! print {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!($fmt $(, $($arg)+)?))
    }
}

/// Print to console with newline
#[macro_export]
macro_rules! println {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!(concat!($fmt, "\n") $(, $($arg)+)?))
    };
    () => {
        $crate::console::print(format_args!("\n"))
    }
}

struct SbiLogger;

static LOGGER: SbiLogger = SbiLogger;

impl log::Log for SbiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (level_str, msg_color) = match record.level() {
            Level::Error => ("\x1b[31mERROR\x1b[0m", "\x1b[31m"),
            Level::Warn => ("\x1b[33mWARN\x1b[0m", "\x1b[33m"),
            Level::Info => ("\x1b[32mINFO\x1b[0m", "\x1b[37m"),
            Level::Debug => ("\x1b[90mDEBUG\x1b[0m", "\x1b[90m"),
            Level::Trace => ("\x1b[90mTRACE\x1b[0m", "\x1b[90m"),
        };
        print(format_args!(
            "[{}] {}{}\x1b[0m\n",
            level_str,
            msg_color,
            record.args()
        ));
    }

    fn flush(&self) {}
}

/// Installs the logger at the level chosen by `LOG` at build time.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(kairos_kernel::config::log_level());
    }
}
