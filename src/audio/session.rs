use crate::driver::{ContextHandle, DeviceDriver, DeviceHandle};
use crate::error::{DriverError, Error};
use log::{debug, error, info, warn};

/// An opened output device together with its current rendering context.
///
/// The context is made current on [`AudioSession::open`] and released again
/// on [`AudioSession::close`] or when the session is dropped, whichever
/// comes first.
pub struct AudioSession<D: DeviceDriver> {
    driver: D,
    device: DeviceHandle,
    context: ContextHandle,
    released: bool,
}

impl<D: DeviceDriver> AudioSession<D> {
    /// Open `device_name` (or the default device) and make a fresh context current
    pub fn open(driver: D, device_name: Option<&str>) -> Result<Self, Error> {
        let device = match driver.open_device(device_name) {
            Ok(device) => device,
            Err(e) => {
                error!("Failed to open audio device: {}", e);
                return Err(Error::DeviceOpen(e));
            }
        };

        let context = match driver.create_context(device) {
            Ok(context) => context,
            Err(e) => {
                error!("Failed to create audio context: {}", e);
                if let Err(close_err) = driver.close_device(device) {
                    warn!("Failed to close {} after context failure: {}", device, close_err);
                }
                return Err(Error::ContextCreate(e));
            }
        };

        if let Err(e) = driver.make_context_current(Some(context)) {
            error!("Failed to make {} current: {}", context, e);
            if let Err(destroy_err) = driver.destroy_context(context) {
                warn!("Failed to destroy {}: {}", context, destroy_err);
            }
            if let Err(close_err) = driver.close_device(device) {
                warn!("Failed to close {}: {}", device, close_err);
            }
            return Err(Error::Driver(e));
        }

        info!("Audio session opened on {} with {}", device, context);
        Ok(Self {
            driver,
            device,
            context,
            released: false,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn device(&self) -> DeviceHandle {
        self.device
    }

    pub fn context(&self) -> ContextHandle {
        self.context
    }

    /// Release the context and device, reporting the first failure
    pub fn close(mut self) -> Result<(), Error> {
        self.release().map_err(Error::from)
    }

    /// Runs every teardown step even if an earlier one fails.
    fn release(&mut self) -> Result<(), DriverError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let cleared = self.driver.make_context_current(None);
        let destroyed = self.driver.destroy_context(self.context);
        let closed = self.driver.close_device(self.device);
        debug!("Released {} and {}", self.context, self.device);

        cleared.and(destroyed).and(closed)
    }
}

impl<D: DeviceDriver> Drop for AudioSession<D> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Audio session teardown failed: {}", e);
        }
    }
}
