//! Link layer: the keyboard on top of `usb-device` and `usbd-hid`.
//!
//! `usbd-hid` owns the interface, its descriptors and the interrupt IN endpoint.
//! `KeyboardRequests` sits in front of it on the control pipe and answers the HID class
//! requests itself, observes bus resets (the calibration trigger) and tracks whether the
//! last input report has been picked up by the host.

// USB Device support
use usb_device::control::RequestType;
use usb_device::{class_prelude::*, prelude::*};

// USB Human Interface Device (HID) Class support
use usbd_hid::hid_class::HIDClass;

use crate::report::{Report, REPORT_DESCRIPTOR};
use crate::requests::{ClassRequest, ClassRequests, Reply};

/// Interrupt endpoint polling interval
pub const POLL_MS: u8 = 10;

/// Shared VID/PID for HID keyboards (obdev)
pub const VID_PID: UsbVidPid = UsbVidPid(0x16c0, 0x27db);

/// Where input reports go. Accepts one report at a time.
pub trait ReportSink {
    type Error;

    /// The previous report has been picked up and a new one can be queued
    fn is_ready(&self) -> bool;

    fn send_report(&mut self, report: &Report) -> Result<(), Self::Error>;
}

/// Control pipe handler for the HID class requests, plus bus event bookkeeping.
///
/// Must come before the `HIDClass` in the list given to `UsbDevice::poll`, so that it sees
/// the class requests first.
#[derive(Default)]
pub struct KeyboardRequests {
    requests: ClassRequests,
    reset_observed: bool,
    in_flight: bool,
}

impl KeyboardRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a bus reset happened since the last call
    pub fn take_reset(&mut self) -> bool {
        core::mem::replace(&mut self.reset_observed, false)
    }

    pub fn idle_rate(&self) -> u8 {
        self.requests.idle_rate()
    }

    fn on_bus_reset(&mut self) {
        self.reset_observed = true;
        self.in_flight = false;
    }

    fn on_report_delivered(&mut self) {
        self.in_flight = false;
    }
}

impl<B: UsbBus> UsbClass<B> for KeyboardRequests {
    fn reset(&mut self) {
        self.on_bus_reset();
    }

    fn endpoint_in_complete(&mut self, _addr: EndpointAddress) {
        // The HID input endpoint is the only non-control IN endpoint on the device
        self.on_report_delivered();
    }

    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = *xfer.request();
        let reply = match req.request_type {
            RequestType::Class => self
                .requests
                .handle(ClassRequest::decode(req.request, req.value)),
            // No vendor specific requests implemented
            RequestType::Vendor => Reply::NoData,
            // Descriptors etc. are left to the HID class and the device
            _ => return,
        };

        let _ = match reply {
            Reply::Report(report) => xfer.accept_with(&report),
            Reply::Idle(rate) => xfer.accept_with(&[rate]),
            Reply::NoData => xfer.accept_with(&[]),
        };
    }

    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = *xfer.request();
        match req.request_type {
            RequestType::Class => {
                self.requests.handle(ClassRequest::decode(req.request, req.value));
            }
            RequestType::Vendor => {}
            _ => return,
        }

        let _ = xfer.accept();
    }
}

/// The whole USB side of the device
pub struct KeyboardUsb<'a, B: UsbBus> {
    device: UsbDevice<'a, B>,
    requests: KeyboardRequests,
    hid: HIDClass<'a, B>,
}

impl<'a, B: UsbBus> KeyboardUsb<'a, B> {
    /// `None` if the string descriptors are rejected by the device builder.
    pub fn new(bus: &'a UsbBusAllocator<B>) -> Option<Self> {
        // Set up the USB HID Class Device driver
        let hid = HIDClass::new(bus, &REPORT_DESCRIPTOR, POLL_MS);

        let device = UsbDeviceBuilder::new(bus, VID_PID)
            .strings(&[StringDescriptors::default()
                .manufacturer("keyscript")
                .product("Keyscript Keyboard")
                .serial_number("0000")])
            .ok()?
            .device_class(0)
            .build();

        Some(KeyboardUsb {
            device,
            requests: KeyboardRequests::new(),
            hid,
        })
    }

    /// Service the bus. Returns `true` when a bus reset was observed, i.e. when the
    /// oscillator should be recalibrated before the bus is serviced again.
    pub fn poll(&mut self) -> bool {
        self.device.poll(&mut [&mut self.requests, &mut self.hid]);
        self.requests.take_reset()
    }

    pub fn state(&self) -> UsbDeviceState {
        self.device.state()
    }

    pub fn idle_rate(&self) -> u8 {
        self.requests.idle_rate()
    }
}

impl<B: UsbBus> ReportSink for KeyboardUsb<'_, B> {
    type Error = UsbError;

    fn is_ready(&self) -> bool {
        self.device.state() == UsbDeviceState::Configured && !self.requests.in_flight
    }

    fn send_report(&mut self, report: &Report) -> Result<(), UsbError> {
        self.hid.push_raw_input(&report.as_bytes())?;
        self.requests.in_flight = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_reported_once() {
        let mut requests = KeyboardRequests::new();
        assert!(!requests.take_reset());

        requests.in_flight = true;
        requests.on_bus_reset();
        assert!(!requests.in_flight);
        assert!(requests.take_reset());
        assert!(!requests.take_reset());
    }

    #[test]
    fn delivery_frees_the_slot() {
        let mut requests = KeyboardRequests::new();
        requests.in_flight = true;

        requests.on_report_delivered();
        assert!(!requests.in_flight);
    }

    #[test]
    fn starts_with_default_idle_rate() {
        let requests = KeyboardRequests::new();
        assert_eq!(requests.idle_rate(), 0);
    }
}
