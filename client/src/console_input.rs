use std::io::stdin;
use std::thread;

use tokio::sync::mpsc::{self, Receiver};

/// Reads stdin on a dedicated thread; lines arrive on the returned channel,
/// which closes at end of input.
pub fn console_input_thread() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel(100);
    thread::spawn(move || pollster::block_on(console_input_loop(sender)));
    receiver
}

async fn console_input_loop(sender: mpsc::Sender<String>) {
    loop {
        let mut input = String::new();
        match stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if sender.send(input).await.is_err() {
            break;
        }
    }
}
