use std::sync::{Arc, Mutex, MutexGuard};

use super::FileService;

/// A [FileService] that several threads can hold at once.
///
/// Operations are serialized by one lock, so each runs alone
/// against the two images.
#[derive(Debug)]
pub struct SharedFileService<D>(Arc<Mutex<FileService<D>>>);

impl<D> Clone for SharedFileService<D> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<D> SharedFileService<D> {
    pub fn new(service: FileService<D>) -> Self {
        Self(Arc::new(Mutex::new(service)))
    }

    /// Wait for exclusive access.
    ///
    /// A panic in another holder does not poison the service,
    /// every operation either finished or left the images as they were.
    pub fn lock(&self) -> MutexGuard<'_, FileService<D>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut FileService<D>) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::MemDisk,
        fs::{Layout, MAX_FILES},
    };
    use std::thread;

    #[test]
    fn test_concurrent_creates_get_distinct_slots() {
        let layout = Layout::new(0);
        let service = FileService::format(MemDisk::new(layout.end_sector()), layout).unwrap();
        let shared = SharedFileService::new(service);

        let handles: Vec<_> = (0..MAX_FILES)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared
                        .with(|fs| fs.create(&format!("t{i}"), &[i as u8; 700]))
                        .unwrap()
                })
            })
            .collect();
        let mut slots: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        slots.sort_unstable();
        assert_eq!(slots, (0..MAX_FILES).collect::<Vec<_>>());

        let fs = shared.lock();
        assert_eq!(fs.used_blocks(), MAX_FILES * 2);
        for i in 0..MAX_FILES {
            assert_eq!(fs.read_to_vec(&format!("t{i}")).unwrap(), vec![i as u8; 700]);
        }
    }
}
