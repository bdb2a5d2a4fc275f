//! [`super::Command::UnloadModule`] takes just the index of a previously loaded module; there is
//! no corresponding load command, since nothing here loads modules itself (only unloads ones a
//! backend may have left behind, e.g. `module-switch-on-port-available`).
