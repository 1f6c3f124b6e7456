pub(crate) mod dialogs;
pub(crate) mod status_bar;
