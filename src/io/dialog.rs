// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Native message dialogs.

use crate::controller::interaction::Confirm;
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

/// Yes/No confirmation through a blocking native dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogConfirm;

impl Confirm for DialogConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        let result = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Confirm")
            .set_description(message)
            .set_buttons(MessageButtons::YesNo)
            .show();

        // closing the dialog counts as no
        result == MessageDialogResult::Yes
    }
}

/// Report an error the user has to see.
pub fn show_error(title: &str, message: &str) {
    log::error!("{}: {}", title, message);
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}
