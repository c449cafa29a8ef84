//! Erase and program of one settings page through the boot ROM flash routines.
//!
//! While the flash is being erased or programmed it is not mapped (XIP is off), so the
//! routine doing it must not touch flash: it runs from RAM and only calls ROM function
//! pointers that were looked up beforehand. Looking them up (and the wrappers that do it)
//! lives in flash, hence the `RomFlash` table.

/// Size of one flash page (programming unit)
pub const PAGE_SIZE: usize = 256;

/// Size of one flash sector (smallest erase unit)
pub const SECTOR_SIZE: u32 = 4096;

// 64k block erase, used by the boot ROM when the range allows it
const BLOCK_SIZE: u32 = 1 << 16;
const BLOCK_ERASE_CMD: u8 = 0xd8;

/// Boot ROM flash routines, resolved while the flash is still mapped.
#[derive(Clone, Copy)]
pub struct RomFlash {
    pub connect_internal_flash: unsafe extern "C" fn(),
    pub flash_exit_xip: unsafe extern "C" fn(),
    pub flash_range_erase: unsafe extern "C" fn(u32, usize, u32, u8),
    pub flash_range_program: unsafe extern "C" fn(u32, *const u8, usize),
    pub flash_flush_cache: unsafe extern "C" fn(),
    pub flash_enter_cmd_xip: unsafe extern "C" fn(),
}

/// Copy of a settings page with one byte replaced, from the currently mapped contents.
pub fn patched_page<F: Fn(usize) -> u8>(read: F, offset: usize, value: u8) -> [u8; PAGE_SIZE] {
    let mut page = [0xffu8; PAGE_SIZE];
    for (ix, b) in page.iter_mut().enumerate() {
        *b = read(ix);
    }
    page[offset % PAGE_SIZE] = value;
    page
}

/// Erase the sector at `flash_offset` and program `page` at its start.
///
/// # Safety
///
/// Interrupts must be off and the other core parked: nothing may execute from flash until
/// this returns. `flash_offset` must be sector aligned and inside the flash, and the
/// `rom` pointers must be the boot ROM routines.
#[inline(never)]
#[cfg_attr(
    all(target_arch = "arm", target_os = "none"),
    link_section = ".data.ram_func"
)]
pub unsafe fn erase_and_program(rom: &RomFlash, flash_offset: u32, page: *const u8) {
    (rom.connect_internal_flash)();
    (rom.flash_exit_xip)();
    (rom.flash_range_erase)(
        flash_offset,
        SECTOR_SIZE as usize,
        BLOCK_SIZE,
        BLOCK_ERASE_CMD,
    );
    (rom.flash_range_program)(flash_offset, page, PAGE_SIZE);
    (rom.flash_flush_cache)();
    (rom.flash_enter_cmd_xip)();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Connect,
        ExitXip,
        Erase(u32, usize, u32, u8),
        Program(u32, Vec<u8>),
        Flush,
        EnterXip,
    }

    static CALLS: Mutex<Vec<Call>> = Mutex::new(Vec::new());

    fn record(call: Call) {
        CALLS.lock().unwrap().push(call);
    }

    unsafe extern "C" fn connect() {
        record(Call::Connect);
    }

    unsafe extern "C" fn exit_xip() {
        record(Call::ExitXip);
    }

    unsafe extern "C" fn erase(addr: u32, count: usize, block: u32, cmd: u8) {
        record(Call::Erase(addr, count, block, cmd));
    }

    unsafe extern "C" fn program(addr: u32, data: *const u8, count: usize) {
        let bytes = std::slice::from_raw_parts(data, count).to_vec();
        record(Call::Program(addr, bytes));
    }

    unsafe extern "C" fn flush() {
        record(Call::Flush);
    }

    unsafe extern "C" fn enter_xip() {
        record(Call::EnterXip);
    }

    #[test]
    fn can_patch_one_byte() {
        let page = patched_page(|ix| ix as u8, 3, 0x42);
        assert_eq!(page[2], 2);
        assert_eq!(page[3], 0x42);
        assert_eq!(page[255], 255);
    }

    #[test]
    fn programs_only_through_the_rom_table() {
        let rom = RomFlash {
            connect_internal_flash: connect,
            flash_exit_xip: exit_xip,
            flash_range_erase: erase,
            flash_range_program: program,
            flash_flush_cache: flush,
            flash_enter_cmd_xip: enter_xip,
        };
        let page = patched_page(|_| 0xff, 0, 125);

        unsafe { erase_and_program(&rom, 0x7f_f000, page.as_ptr()) };

        let calls = CALLS.lock().unwrap();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[0], Call::Connect);
        assert_eq!(calls[1], Call::ExitXip);
        assert_eq!(calls[2], Call::Erase(0x7f_f000, 4096, 1 << 16, 0xd8));
        let Call::Program(addr, ref bytes) = calls[3] else {
            panic!("expected a program call, got {:?}", calls[3]);
        };
        assert_eq!(addr, 0x7f_f000);
        assert_eq!(bytes.len(), PAGE_SIZE);
        assert_eq!(bytes[0], 125);
        assert!(bytes[1..].iter().all(|b| *b == 0xff));
        assert_eq!(calls[4], Call::Flush);
        assert_eq!(calls[5], Call::EnterXip);
    }
}
