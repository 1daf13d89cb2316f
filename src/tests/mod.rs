mod frame;
mod mailbox;
