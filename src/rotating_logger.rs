use core::cell::RefCell;
use core::fmt::Write;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use esp_println::println;
use log::{Level, Log, Metadata, Record};
use picoserve::make_static;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

const BUFFER_SIZE: usize = 4096;
const MIN_LEVEL: Level = Level::Info;

/// Logger that prints to the serial console and keeps the most recent output in memory,
/// so it can be served over http.
pub struct RingBufferLogger {
    buffer: Mutex<CriticalSectionRawMutex, RefCell<RingBufferWrapper>>,
}

impl RingBufferLogger {
    pub fn init() -> &'static Self {
        let logger = make_static!(
            RingBufferLogger,
            Self {
                buffer: Mutex::new(RefCell::new(RingBufferWrapper(
                    ConstGenericRingBuffer::new()
                )))
            }
        );

        // Safety: The `make_static` macro above will panic if this code is ran more than once
        // We only call `set_logger` in this function so this is safe.
        unsafe {
            if log::set_logger_racy(logger).is_err() {
                println!("Logger was already installed");
            }
            log::set_max_level_racy(MIN_LEVEL.to_level_filter());
        }

        logger
    }

    /// Buffered log lines, oldest first. Once the buffer wrapped, the partially
    /// overwritten first line is dropped.
    pub fn get_logs(&self) -> heapless::Vec<u8, BUFFER_SIZE> {
        self.buffer.lock(|buffer| {
            let buffer = buffer.borrow();
            let skip = if buffer.0.is_full() {
                buffer.0.iter().position(|b| *b == b'\n').map_or(0, |i| i + 1)
            } else {
                0
            };
            buffer.0.iter().skip(skip).cloned().collect()
        })
    }
}

impl Log for RingBufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= MIN_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let module_path = record.module_path().unwrap_or("???");
        println!("[{}] {} - {}", record.level(), module_path, record.args());
        self.buffer.lock(|buffer| {
            let mut buffer = buffer.borrow_mut();
            // Writing into the ring buffer never fails
            let _ = writeln!(
                buffer,
                "[{}] {} - {}",
                record.level(),
                module_path,
                record.args()
            );
        });
    }

    fn flush(&self) {}
}

struct RingBufferWrapper(ConstGenericRingBuffer<u8, BUFFER_SIZE>);

impl Write for RingBufferWrapper {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.extend(s.as_bytes().iter().cloned());
        Ok(())
    }
}
