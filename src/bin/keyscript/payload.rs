//! The built-in script: open the run dialog, start notepad and type a note.

use keyscript::keys::*;
use keyscript::script;
use keyscript::script::{join, typed};
use keyscript::timing::ms_to_ticks;

/// Win+R, then give the dialog time to show up.
///
/// Starts with a blank entry so that the first report after enumeration is all-keys-up.
const OPEN_RUN: [u8; 9] = script![
    (MOD_NONE, NONE, 0),
    (MOD_GUI, R, ms_to_ticks(50)),
    (MOD_NONE, NONE, ms_to_ticks(600)),
];

const LAUNCH: [u8; 24] = typed(b"notepad\n");

// notepad takes a while on a cold start
const WAIT_EDITOR: [u8; 3] = script![(MOD_NONE, NONE, ms_to_ticks(2000))];

const MESSAGE: [u8; 66] = typed(b"Hello from keyscript!\n");

pub const PAYLOAD: [u8; 102] = join::<36, 66, 102>(
    &join::<33, 3, 36>(&join::<9, 24, 33>(&OPEN_RUN, &LAUNCH), &WAIT_EDITOR),
    &MESSAGE,
);
