use crossbeam::channel::{self, Receiver, Sender};
use mousevr_core::ZoneEvent;
use std::io::{self, BufRead};
use std::thread;
use tracing::{debug, warn};

/// Reads scene object names from stdin, one per line, and forwards the ones
/// that decode as trigger zones. Stands in for the collision layer when no
/// renderer is attached.
pub fn spawn_stdin_feed() -> io::Result<Receiver<ZoneEvent>> {
    let (tx, rx) = channel::unbounded();
    thread::Builder::new()
        .name("mousevr-zones".into())
        .spawn(move || {
            let forwarded = feed(io::stdin().lock(), &tx);
            debug!(forwarded, "zone feed closed");
        })?;
    Ok(rx)
}

/// Forwards trigger zones from `reader` until EOF, a read error or a closed
/// receiver. Returns how many events were sent.
fn feed<R: BufRead>(reader: R, tx: &Sender<ZoneEvent>) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("zone feed read failed: {}", e);
                break;
            }
        };
        let name = line.trim();
        match ZoneEvent::from_object_name(name) {
            Some(event) => {
                if tx.send(event).is_err() {
                    break;
                }
                forwarded += 1;
            }
            None => debug!(name, "not a trigger zone"),
        }
    }
    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn forwards_triggers_and_stops_at_eof() {
        let (tx, rx) = channel::unbounded();
        let input = Cursor::new("_ldoor_r_\nwall\n\n  _end_r_  \n_a_b_r_\n");

        assert_eq!(feed(input, &tx), 2);
        let objects: Vec<String> = rx.try_iter().map(|e| e.object).collect();
        assert_eq!(objects, vec!["ldoor", "end"]);
    }

    #[test]
    fn stops_when_receiver_is_gone() {
        let (tx, rx) = channel::unbounded();
        drop(rx);
        let input = Cursor::new("_ldoor_r_\n_rdoor_r_\n");
        assert_eq!(feed(input, &tx), 0);
    }
}
