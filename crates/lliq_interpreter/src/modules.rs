use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::caveman;
use crate::interpreter::Interpreter;

const MODULE_EXT: &str = ".langlowiq";

impl Interpreter {
    /// Load a module by name from `modules/` then `libs/`. A module is
    /// executed at most once per interpreter; re-stealing an already
    /// loaded module is a no-op.
    pub fn steal(&mut self, name: &str) -> bool {
        let path = match self.resolve_module(name) {
            Some(path) => path,
            None => {
                self.report(&caveman(
                    0,
                    &format!("{} not found to steal", name),
                    "put it in modules/ or libs/",
                ));
                return false;
            }
        };

        // canonical path so the same file loaded from both roots counts once
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if self.loaded.contains(&key) {
            self.report(&format!("[steal] {} already loaded", name));
            return true;
        }

        let code = match std::fs::read_to_string(&path) {
            Ok(code) => code,
            Err(err) => {
                self.report(&caveman(
                    0,
                    &format!("failed steal {}", name),
                    &err.to_string(),
                ));
                return false;
            }
        };

        log::debug!("loading module {} from {}", name, path.display());
        // marked before running so circular steals terminate
        self.loaded.insert(key);
        self.run(&code);
        self.report(&format!("[steal] {} loaded", name));
        true
    }

    fn resolve_module(&self, name: &str) -> Option<PathBuf> {
        let file = if name.ends_with(MODULE_EXT) {
            name.to_string()
        } else {
            format!("{}{}", name, MODULE_EXT)
        };
        let candidates = [self.modules_path.join(&file), self.libs_path.join(&file)];
        candidates.iter().find(|path| path.exists()).cloned()
    }

    /// Fetch a library from the network into `libs/`. A bare name expands
    /// to candidate URLs; a `.zip` target is unpacked, anything else is
    /// saved as a single file. Failures are reported, never raised.
    pub fn steal_from_internet(&mut self, url_or_name: &str) -> bool {
        let targets = if url_or_name.starts_with("http://") || url_or_name.starts_with("https://") {
            vec![url_or_name.to_string()]
        } else {
            vec![
                format!("https://example.com/langlibs/{}{}", url_or_name, MODULE_EXT),
                format!("https://example.com/langlibs/{}.zip", url_or_name),
            ]
        };

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(6))
            .build();

        for target in targets {
            self.report(&format!("[stealfrominternet] trying {}", target));
            let data = match fetch_bytes(&agent, &target) {
                Some(data) => data,
                None => continue,
            };
            if target.ends_with(".zip") {
                match zip::ZipArchive::new(std::io::Cursor::new(data)) {
                    Ok(mut archive) => {
                        if archive.extract(&self.libs_path).is_ok() {
                            self.report("[stealfrominternet] unpacked zip to libs/");
                            return true;
                        }
                    }
                    Err(err) => log::debug!("bad archive from {}: {}", target, err),
                }
            } else {
                let file_name = target.rsplit('/').next().unwrap_or("stolen.langlowiq");
                if std::fs::write(self.libs_path.join(file_name), &data).is_ok() {
                    self.report("[stealfrominternet] saved to libs/");
                    return true;
                }
            }
        }

        self.report("[stealfrominternet] no luck, put lib in libs/ manually");
        false
    }

    /// Write the built-in library files into `libs/` unless already there.
    pub(crate) fn ensure_builtin_libs(&mut self) -> std::io::Result<()> {
        let libs = [
            (
                "dumbmath.langlowiq",
                "# dumbmath\n\
                 do_thing dumbadd a b:\n    giveback a + b\n\
                 do_thing dumbsub a b:\n    giveback a - b\n\
                 do_thing dumbmul a b:\n    giveback a * b\n\
                 do_thing dumbdiv a b:\n    giveback a / b\n",
            ),
            (
                "stringstuff.langlowiq",
                "# stringstuff\n\
                 do_thing smash a b:\n    giveback smash a b\n\
                 do_thing uppercase s:\n    giveback uppercase s\n\
                 do_thing lowercase s:\n    giveback lowercase s\n\
                 do_thing slice s a b:\n    giveback slice s a b\n",
            ),
            (
                "filestuff.langlowiq",
                "# filestuff\n\
                 do_thing scribblef filename content:\n    scribble filename with content\n\
                 do_thing fetchf filename var:\n    fetch filename into var\n",
            ),
            (
                "randomstuff.langlowiq",
                "# randomstuff\n\
                 do_thing randit a b:\n    giveback randint a b\n\
                 do_thing pickone a b c:\n    giveback choice a b c\n",
            ),
        ];

        for (file_name, contents) in &libs {
            let path = self.libs_path.join(file_name);
            if !path.exists() {
                std::fs::write(&path, contents)?;
            }
        }
        Ok(())
    }
}

fn fetch_bytes(agent: &ureq::Agent, url: &str) -> Option<Vec<u8>> {
    let response = match agent.get(url).call() {
        Ok(response) => response,
        Err(err) => {
            log::debug!("fetch of {} failed: {}", url, err);
            return None;
        }
    };
    let mut buffer = Vec::new();
    match response.into_reader().read_to_end(&mut buffer) {
        Ok(_) => Some(buffer),
        Err(err) => {
            log::debug!("read of {} failed: {}", url, err);
            None
        }
    }
}
