//! Instrument session controller
//!
//! Owns one connection to the instrument and runs every operation as a
//! strict request/response exchange: encode, write one frame, wait for the
//! settle delay, read one frame, then check the acknowledgment or parse the
//! value. One command is in flight at a time.
//!
//! The controller tracks the instrument mode so that redundant mode
//! switches are not sent, and so that acquisitions can restore the mode
//! they started from. After a transport or framing failure the stream
//! position is unknown and the session refuses further commands.

use crate::command::{
    AcquisitionRequest, CameraRoi, ChannelSettings, Command, FilenameAttribute, PlateAxis,
    ScriptFile, TemperatureProbe, ZStack, DEFAULT_WELL_LEADING_CHAR,
};
use crate::communication::{self, frame, ConnectionParams};
use crate::dialect::{create_dialect, payload_text, Dialect};
use crate::response::Value;
use imctl_core::{
    ChannelMask, ConnectionError, ControllerError, DialectKind, LightSource, Mode, Position,
    ProtocolError, Result, SessionState,
};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Options applied to every exchange of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Delay between sending a command and reading its response
    pub settle_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(communication::DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

/// Session with one instrument
///
/// Generic over the byte stream so tests can drive it with an in-memory
/// pipe; [`SessionController::connect`] opens a TCP stream.
///
/// Call [`SessionController::close`] when done: it returns the instrument to
/// live mode and switches the light sources off.
pub struct SessionController<S = TcpStream> {
    stream: S,
    dialect: Box<dyn Dialect>,
    options: SessionOptions,
    state: SessionState,
    desynchronized: bool,
    closed: bool,
}

impl SessionController<TcpStream> {
    /// Connect to the instrument described by `params`
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        let stream = communication::connect(params).await?;
        Ok(Self::with_stream(
            stream,
            create_dialect(params.dialect),
            SessionOptions {
                settle_delay: params.settle_delay(),
            },
        ))
    }
}

impl<S> SessionController<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream
    pub fn with_stream(stream: S, dialect: Box<dyn Dialect>, options: SessionOptions) -> Self {
        Self {
            stream,
            dialect,
            options,
            state: SessionState::default(),
            desynchronized: false,
            closed: false,
        }
    }

    /// Dialect spoken on this session
    pub fn dialect_kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    /// State confirmed by the instrument so far
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Cached mode, `None` until queried or set
    pub fn cached_mode(&self) -> Option<Mode> {
        self.state.mode
    }

    /// Check if a previous failure left the stream misaligned
    pub fn is_desynchronized(&self) -> bool {
        self.desynchronized
    }

    /// Check if the dialect can encode a command
    pub fn supports(&self, command: &Command) -> bool {
        self.dialect.supports(command)
    }

    /// One request/response exchange, returning the response payload
    async fn exchange(&mut self, command: &Command) -> Result<Vec<u8>> {
        if self.desynchronized {
            return Err(ConnectionError::Desynchronized.into());
        }

        let payload = self.dialect.encode(command)?;
        tracing::debug!("Sending {}: {}", command.name(), payload_text(&payload));

        let result = self.transfer(&payload).await;
        match &result {
            Ok(response) => {
                tracing::trace!("Received for {}: {}", command.name(), payload_text(response))
            }
            Err(e) => {
                tracing::error!("Exchange for {} failed: {}", command.name(), e);
                if e.breaks_stream() {
                    self.desynchronized = true;
                }
            }
        }
        result
    }

    async fn transfer(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        frame::write_frame(&mut self.stream, payload).await?;
        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }
        frame::read_frame(&mut self.stream).await
    }

    /// Send an action and check its acknowledgment
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<()> {
        let response = self.exchange(command).await?;
        self.dialect.check_acknowledgment(command, &response)
    }

    /// Send a query and parse its feedback value
    pub(crate) async fn query(&mut self, command: &Command) -> Result<Value> {
        let response = self.exchange(command).await?;
        let value = self.dialect.parse_value(command, &response);
        if let Err(e) = &value {
            tracing::error!("Invalid feedback for {}: {}", command.name(), e);
            if e.breaks_stream() {
                self.desynchronized = true;
            }
        }
        value
    }

    async fn query_f64(&mut self, command: Command) -> Result<f64> {
        Ok(self.query(&command).await?.into_f64()?)
    }

    async fn query_i64(&mut self, command: Command) -> Result<i64> {
        Ok(self.query(&command).await?.into_i64()?)
    }

    async fn query_bool(&mut self, command: Command) -> Result<bool> {
        Ok(self.query(&command).await?.into_bool()?)
    }

    async fn query_string(&mut self, command: Command) -> Result<String> {
        Ok(self.query(&command).await?.into_string())
    }

    // Instrument information

    /// Version string of the instrument software
    pub async fn get_version(&mut self) -> Result<String> {
        self.query_string(Command::GetVersion).await
    }

    /// Raw status text, `Ready` or `Busy`
    pub async fn get_status(&mut self) -> Result<String> {
        self.query_string(Command::GetStatus).await
    }

    // Mode

    /// Query the instrument for its live-mode flag
    pub async fn is_live_mode_active(&mut self) -> Result<bool> {
        let live = self.query_bool(Command::LiveModeActive).await?;
        self.state.mode = Some(Mode::from_live_flag(live));
        Ok(live)
    }

    /// Query the current mode
    pub async fn get_mode(&mut self) -> Result<Mode> {
        let live = self.is_live_mode_active().await?;
        Ok(Mode::from_live_flag(live))
    }

    /// Check if a script or acquisition is running
    pub async fn is_script_running(&mut self) -> Result<bool> {
        Ok(!self.is_live_mode_active().await?)
    }

    /// Cached mode, querying the instrument when it is unknown
    async fn current_mode(&mut self) -> Result<Mode> {
        match self.state.mode {
            Some(mode) => Ok(mode),
            None => self.get_mode().await,
        }
    }

    /// Switch to the given mode
    ///
    /// Nothing is sent when the instrument is already in that mode.
    pub async fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if self.current_mode().await? == mode {
            tracing::debug!("Instrument already in {} mode", mode);
            return Ok(());
        }

        self.execute(&Command::SetScriptMode(mode)).await?;
        self.state.mode = Some(mode);
        tracing::info!("Switched instrument to {} mode", mode);
        Ok(())
    }

    // Position

    pub async fn get_position_x(&mut self) -> Result<f64> {
        let x = self.query_f64(Command::GetPositionX).await?;
        self.state.position.x = Some(x);
        Ok(x)
    }

    pub async fn get_position_y(&mut self) -> Result<f64> {
        let y = self.query_f64(Command::GetPositionY).await?;
        self.state.position.y = Some(y);
        Ok(y)
    }

    pub async fn get_position_z(&mut self) -> Result<f64> {
        let z = self.query_f64(Command::GetPositionZ).await?;
        self.state.position.z = Some(z);
        Ok(z)
    }

    /// Query all three axes
    pub async fn get_position(&mut self) -> Result<Position> {
        let x = self.get_position_x().await?;
        let y = self.get_position_y().await?;
        let z = self.get_position_z().await?;
        Ok(Position::new(x, y, z))
    }

    /// Move the objective in X/Y (mm)
    pub async fn go_to_xy(&mut self, x: f64, y: f64) -> Result<()> {
        self.execute(&Command::go_to_xy(x, y)?).await?;
        self.state.position.x = Some(x);
        self.state.position.y = Some(y);
        Ok(())
    }

    /// Move the objective in Z (µm)
    pub async fn go_to_z(&mut self, z: f64) -> Result<()> {
        self.execute(&Command::go_to_z(z)?).await?;
        self.state.position.z = Some(z);
        Ok(())
    }

    /// Move the objective in X/Y (mm) and Z (µm) with one command
    pub async fn go_to_xyz(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        self.execute(&Command::go_to_xyz(x, y, z)?).await?;
        self.state.position = Position::new(x, y, z).into();
        Ok(())
    }

    /// Z-stack center currently set in the instrument software
    pub async fn get_z_stack_center(&mut self) -> Result<f64> {
        self.query_f64(Command::GetZStackCenter).await
    }

    /// Well under the objective, ex: `B002`
    pub async fn get_well_coordinate(&mut self) -> Result<String> {
        self.query_string(Command::GetWellCoordinate).await
    }

    // Objective and light

    /// Selected objective index
    pub async fn get_objective_index(&mut self) -> Result<u8> {
        let raw = self.query_i64(Command::GetObjective).await?;
        let index = u8::try_from(raw).map_err(|_| ProtocolError::InvalidValue {
            raw: raw.to_string(),
            kind: "objective index".to_string(),
        })?;
        self.state.objective_index = Some(index);
        Ok(index)
    }

    /// Select the objective (1 to 4)
    pub async fn set_objective(&mut self, index: u8) -> Result<()> {
        self.execute(&Command::set_objective(index)?).await?;
        self.state.objective_index = Some(index);
        Ok(())
    }

    /// Light channel currently selected in the instrument software
    pub async fn get_light_channel(&mut self) -> Result<i64> {
        self.query_i64(Command::GetLightChannel).await
    }

    /// Switch on the brightfield source
    ///
    /// In live mode the light switches on at once. In script mode the
    /// settings apply to the next acquisition.
    pub async fn set_bright_field(&mut self, settings: ChannelSettings) -> Result<()> {
        self.set_light_source(LightSource::Brightfield, settings).await
    }

    /// Switch on a combination of fluorescence LEDs
    pub async fn set_fluo_channel(
        &mut self,
        mask: ChannelMask,
        settings: ChannelSettings,
    ) -> Result<()> {
        self.set_light_source(LightSource::Fluorescence(mask), settings)
            .await
    }

    /// Switch on a light source
    pub async fn set_light_source(
        &mut self,
        source: LightSource,
        settings: ChannelSettings,
    ) -> Result<()> {
        self.execute(&Command::set_light_source(source, settings))
            .await?;
        if self.state.mode == Some(Mode::Live) {
            self.state.active_light = Some(source);
        }
        Ok(())
    }

    /// Switch off the brightfield source; a no-op in script mode
    pub async fn set_bright_field_off(&mut self) -> Result<()> {
        self.set_light_source_off(LightSource::Brightfield).await
    }

    /// Switch off the fluorescence LEDs; a no-op in script mode
    pub async fn set_fluo_channel_off(&mut self) -> Result<()> {
        self.set_light_source_off(LightSource::Fluorescence(ChannelMask::all()))
            .await
    }

    /// Switch off a light source; a no-op in script mode
    pub async fn set_light_source_off(&mut self, source: LightSource) -> Result<()> {
        if self.current_mode().await? == Mode::Script {
            tracing::debug!("Script mode, leaving {} untouched", source);
            return Ok(());
        }

        self.switch_off(source).await
    }

    async fn switch_off(&mut self, source: LightSource) -> Result<()> {
        self.execute(&Command::light_source_off(source)).await?;
        if self
            .state
            .active_light
            .is_some_and(|active| active.is_brightfield() == source.is_brightfield())
        {
            self.state.active_light = None;
        }
        Ok(())
    }

    // Camera and filename attributes

    /// Set the camera region of interest and binning
    pub async fn set_camera(&mut self, roi: CameraRoi) -> Result<()> {
        self.execute(&Command::SetCamera(roi)).await
    }

    /// Reset the camera to the full sensor without binning
    pub async fn reset_camera(&mut self) -> Result<()> {
        self.set_camera(CameraRoi::full_frame()).await
    }

    async fn set_filename_attribute(&mut self, attribute: FilenameAttribute) -> Result<()> {
        self.execute(&Command::SetFilenameAttribute(attribute.clone()))
            .await?;

        let attributes = &mut self.state.image_filename_attributes;
        match attribute {
            FilenameAttribute::Well(well) => attributes.well = Some(well),
            FilenameAttribute::WellNumber(n) => attributes.well_number = Some(n),
            FilenameAttribute::Subposition(n) => attributes.subposition = Some(n),
            FilenameAttribute::Timepoint(n) => attributes.timepoint = Some(n),
            FilenameAttribute::Channel(n) => attributes.channel = Some(n),
        }
        Ok(())
    }

    /// Set the well identifier used in image filenames, ex: `A001`
    pub async fn set_well_id(&mut self, well_id: &str) -> Result<()> {
        self.set_well_id_with_leading_char(well_id, DEFAULT_WELL_LEADING_CHAR)
            .await
    }

    /// Set the well identifier with a custom leading character
    pub async fn set_well_id_with_leading_char(
        &mut self,
        well_id: &str,
        leading_char: char,
    ) -> Result<()> {
        self.set_filename_attribute(FilenameAttribute::well(well_id, leading_char)?)
            .await
    }

    pub async fn set_well_number(&mut self, number: u32) -> Result<()> {
        self.set_filename_attribute(FilenameAttribute::well_number(number)?)
            .await
    }

    pub async fn set_subposition(&mut self, number: u32) -> Result<()> {
        self.set_filename_attribute(FilenameAttribute::subposition(number)?)
            .await
    }

    pub async fn set_timepoint(&mut self, number: u32) -> Result<()> {
        self.set_filename_attribute(FilenameAttribute::timepoint(number)?)
            .await
    }

    pub async fn set_channel_number(&mut self, number: u32) -> Result<()> {
        self.set_filename_attribute(FilenameAttribute::channel(number)?)
            .await
    }

    // Lid

    pub async fn open_lid(&mut self) -> Result<()> {
        self.execute(&Command::OpenLid).await
    }

    pub async fn close_lid(&mut self) -> Result<()> {
        self.execute(&Command::CloseLid).await
    }

    pub async fn is_lid_closed(&mut self) -> Result<bool> {
        self.query_bool(Command::IsLidClosed).await
    }

    pub async fn is_lid_opened(&mut self) -> Result<bool> {
        self.query_bool(Command::IsLidOpened).await
    }

    // Temperature

    pub async fn is_temperature_regulated(&mut self) -> Result<bool> {
        self.query_bool(Command::IsTemperatureRegulated).await
    }

    /// Read a temperature sensor (°C)
    pub async fn get_temperature(&mut self, probe: TemperatureProbe) -> Result<f64> {
        self.query_f64(Command::GetTemperature(probe)).await
    }

    pub async fn set_temperature_regulation(&mut self, on: bool) -> Result<()> {
        self.execute(&Command::SetTemperatureRegulation(on)).await
    }

    /// Set the regulation setpoint (°C)
    pub async fn set_target_temperature(&mut self, celsius: f64) -> Result<()> {
        self.execute(&Command::set_target_temperature(celsius)?)
            .await
    }

    // Plate

    pub async fn get_number_of_columns(&mut self) -> Result<i64> {
        self.query_i64(Command::GetWellCount(PlateAxis::Columns))
            .await
    }

    pub async fn get_number_of_rows(&mut self) -> Result<i64> {
        self.query_i64(Command::GetWellCount(PlateAxis::Rows)).await
    }

    // Acquisition

    /// Acquire a Z-stack with one light source
    ///
    /// Switches to script mode for the duration of the acquisition and
    /// restores live mode afterwards when it was active before, also when
    /// the acquisition fails.
    pub async fn acquire(&mut self, request: &AcquisitionRequest) -> Result<()> {
        let initial_mode = self.current_mode().await?;
        self.set_mode(Mode::Script).await?;

        let result = self.acquire_in_script_mode(request).await;

        if initial_mode == Mode::Live {
            if let Err(restore_error) = self.set_mode(Mode::Live).await {
                if result.is_ok() {
                    return Err(restore_error);
                }
                tracing::warn!(
                    "Could not restore live mode after failed acquisition: {}",
                    restore_error
                );
            }
        }
        result
    }

    async fn acquire_in_script_mode(&mut self, request: &AcquisitionRequest) -> Result<()> {
        tracing::info!(
            "Acquiring {} slice(s) around Z={:.1}µm with {}",
            request.z_stack.slices,
            request.z_stack.center_um,
            request.light_source
        );

        self.set_light_source(request.light_source, request.channel)
            .await?;
        self.execute(&Command::Acquire {
            z_stack: request.z_stack,
            save_directory: request.save_directory.clone(),
        })
        .await
    }

    /// Run the software autofocus and return the best Z (µm)
    ///
    /// The light source must have been set up beforehand.
    pub async fn run_software_autofocus(&mut self, z_stack: ZStack) -> Result<f64> {
        self.query_f64(Command::SoftwareAutofocus(z_stack)).await
    }

    // Scripts

    /// Load and start a script
    ///
    /// Refused with [`ControllerError::ScriptAlreadyRunning`] while the
    /// instrument is busy.
    pub async fn run_script(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let script = ScriptFile::new(path.as_ref(), self.dialect.script_extensions())?;

        if self.is_script_running().await? {
            return Err(ControllerError::ScriptAlreadyRunning.into());
        }

        // The instrument leaves live mode on its own while the script runs.
        self.state.mode = None;
        for command in self.dialect.script_commands(&script) {
            self.execute(&command).await?;
        }
        tracing::info!("Started script {}", script.path().display());
        Ok(())
    }

    /// Stop the running script
    pub async fn stop_script(&mut self) -> Result<()> {
        self.state.mode = None;
        self.execute(&Command::StopScript).await?;
        tracing::info!("Stopped script");
        Ok(())
    }

    // Teardown

    /// Put the instrument back in a safe state and close the connection
    ///
    /// Every step is attempted even when an earlier one fails; failures are
    /// logged.
    pub async fn close(mut self) {
        tracing::info!("Closing instrument session");

        if self.dialect.supports(&Command::SetScriptMode(Mode::Live)) {
            if let Err(e) = self.set_mode(Mode::Live).await {
                tracing::warn!("Could not switch back to live mode: {}", e);
                self.state.mode = None;
            }
        }

        // Off commands go out whatever mode the instrument ended up in.
        let sources = [
            LightSource::Brightfield,
            LightSource::Fluorescence(ChannelMask::all()),
        ];
        for source in sources {
            if !self.dialect.supports(&Command::light_source_off(source)) {
                continue;
            }
            if let Err(e) = self.switch_off(source).await {
                tracing::warn!("Could not switch off {}: {}", source, e);
            }
        }

        if let Err(e) = self.stream.shutdown().await {
            tracing::warn!("Could not shut down the connection cleanly: {}", e);
        }
        self.closed = true;
        tracing::info!("Instrument session closed");
    }
}

impl<S> Drop for SessionController<S> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                "Instrument session dropped without close(); the instrument may be left in script mode with light sources on"
            );
        }
    }
}

impl<S> std::fmt::Debug for SessionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("dialect", &self.dialect.kind())
            .field("options", &self.options)
            .field("state", &self.state)
            .field("desynchronized", &self.desynchronized)
            .finish()
    }
}
