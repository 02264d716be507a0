use xgamma_core::{
    Channel, DependencyMissing, GAMMA_STEP, GammaController, GammaState, MAX_GAMMA, MIN_GAMMA,
    ReferencePattern, Settings, XGamma, detect_limited_gamma_support,
};

use iced::widget::{Column, button, column, container, image, row, slider, text, text_input};
use iced::{Element, Length, Size, Task, Theme};
use log::{info, warn};

pub fn main() -> iced::Result {
    env_logger::init();

    iced::application(XGammaApp::default, XGammaApp::update, XGammaApp::view)
        .title("xgamma GUI Tool")
        .window_size(Size::new(640.0, 680.0))
        .theme(XGammaApp::theme)
        .run()
}

struct XGammaApp {
    controller: Option<GammaController<XGamma>>,
    missing: Option<DependencyMissing>,
    status: String,
    warning: Option<String>,

    // Text field contents, committed on submit
    channel_inputs: [String; 3],
    all_input: String,

    pattern: image::Handle,
}

#[derive(Debug, Clone)]
enum Message {
    // Sliders
    ChannelSlid(Channel, f64),
    AllSlid(f64),

    // Text fields
    ChannelEdited(Channel, String),
    ChannelSubmitted(Channel),
    AllEdited(String),
    AllSubmitted,

    // Buttons
    Reset,
    Save,
}

impl Default for XGammaApp {
    fn default() -> Self {
        let bitmap = ReferencePattern::default().render();
        let mut app = Self {
            controller: None,
            missing: None,
            status: String::from("Ready"),
            warning: detect_limited_gamma_support().map(|reason| reason.to_string()),
            channel_inputs: Default::default(),
            all_input: String::new(),
            pattern: image::Handle::from_rgba(bitmap.width, bitmap.height, bitmap.pixels),
        };

        // Nothing is usable without xgamma
        let settings = Settings::detect();
        match settings.locate_tool() {
            Ok(tool) => {
                let mut controller = GammaController::with_settings(tool, &settings);
                if let Err(e) = controller.load_current() {
                    warn!("could not read current gamma: {}", e);
                    app.status = format!("Could not read current gamma: {}", e);
                } else if matches!(controller.is_saved(), Ok(true)) {
                    app.status = String::from("Ready (saved settings found in autostart)");
                }
                info!("using {}", controller.program().display());
                app.controller = Some(controller);
            }
            Err(e) => {
                warn!("{}", e);
                app.missing = Some(e);
            }
        }

        app.sync_inputs();
        app
    }
}

impl XGammaApp {
    fn update(&mut self, message: Message) -> Task<Message> {
        let Some(controller) = self.controller.as_mut() else {
            return Task::none();
        };

        match message {
            Message::ChannelSlid(channel, value) => {
                if let Err(e) = controller.set_channel(channel, value) {
                    self.status = format!("Failed to apply gamma: {}", e);
                }
                self.sync_inputs();
            }

            Message::AllSlid(value) => {
                if let Err(e) = controller.set_all(value) {
                    self.status = format!("Failed to apply gamma: {}", e);
                }
                self.sync_inputs();
            }

            Message::ChannelEdited(channel, value) => {
                self.channel_inputs[index(channel)] = value;
            }

            Message::AllEdited(value) => {
                self.all_input = value;
            }

            Message::ChannelSubmitted(channel) => {
                let input = &self.channel_inputs[index(channel)];
                if let Err(e) = controller.set_channel_text(channel, input) {
                    self.status = format!("Failed to apply gamma: {}", e);
                }
                self.sync_inputs();
            }

            Message::AllSubmitted => {
                if let Err(e) = controller.set_all_text(&self.all_input) {
                    self.status = format!("Failed to apply gamma: {}", e);
                }
                self.sync_inputs();
            }

            Message::Reset => {
                self.status = match controller.reset() {
                    Ok(0) => String::from("Reset to defaults"),
                    Ok(_) => String::from("Reset to defaults and removed from autostart"),
                    Err(e) => format!("Reset to defaults, but: {}", e),
                };
                self.sync_inputs();
            }

            Message::Save => {
                self.status = match controller.save() {
                    Ok(path) => {
                        info!("saved {}", path.display());
                        String::from("Settings saved to autostart")
                    }
                    Err(e) => format!("Error: Failed to save to autostart: {}", e),
                };
            }
        }

        Task::none()
    }

    /// Rewrite the text fields from the stored values.
    fn sync_inputs(&mut self) {
        let Some(controller) = &self.controller else {
            return;
        };
        let state = controller.state();
        for channel in Channel::ALL {
            self.channel_inputs[index(channel)] = state.channel(channel).to_string();
        }
        // "All" has no value while the channels differ
        self.all_input = state.all().map(|v| v.to_string()).unwrap_or_default();
    }

    fn view(&self) -> Element<'_, Message> {
        let content = match (&self.controller, &self.missing) {
            (Some(controller), _) => self.controls(controller.state()),
            (None, Some(missing)) => missing_dependency(missing),
            (None, None) => column![text("Initializing...")].into(),
        };

        container(content).padding(15).into()
    }

    fn controls<'a>(&'a self, state: &GammaState) -> Element<'a, Message> {
        let preview = image(self.pattern.clone())
            .width(Length::Fill)
            .height(Length::Fixed(300.0));

        let warning = match &self.warning {
            Some(warning) => text(warning).size(14),
            None => text("").size(14),
        };

        let mut sliders = Column::new().spacing(10);
        for channel in Channel::ALL {
            sliders = sliders.push(gamma_row(
                channel.label(),
                state.channel(channel).get(),
                &self.channel_inputs[index(channel)],
                "",
                move |v| Message::ChannelSlid(channel, v),
                move |s| Message::ChannelEdited(channel, s),
                Message::ChannelSubmitted(channel),
            ));
        }
        // Park the "All" slider on the mean while channels differ
        let all = state.all().unwrap_or_else(|| state.average());
        sliders = sliders.push(gamma_row(
            "All",
            all.get(),
            &self.all_input,
            "mixed",
            Message::AllSlid,
            Message::AllEdited,
            Message::AllSubmitted,
        ));

        let buttons = row![
            button("Reset").on_press(Message::Reset),
            button("Save to Autostart").on_press(Message::Save),
        ]
        .spacing(40);

        column![
            preview,
            warning,
            sliders,
            buttons,
            text(&self.status).size(14),
        ]
        .spacing(15)
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn gamma_row<'a>(
    label: &'a str,
    value: f64,
    input: &'a str,
    placeholder: &'a str,
    on_slide: impl Fn(f64) -> Message + 'a,
    on_edit: impl Fn(String) -> Message + 'a,
    on_submit: Message,
) -> Element<'a, Message> {
    row![
        text(format!("{}:", label)).width(Length::Fixed(60.0)),
        slider(MIN_GAMMA..=MAX_GAMMA, value, on_slide).step(GAMMA_STEP),
        text_input(placeholder, input)
            .on_input(on_edit)
            .on_submit(on_submit)
            .width(Length::Fixed(70.0)),
    ]
    .spacing(10)
    .into()
}

fn missing_dependency(missing: &DependencyMissing) -> Element<'_, Message> {
    let mut hints = Column::new().spacing(5);
    for (distro, command) in missing.install_hints() {
        hints = hints.push(text(format!("{}: {}", distro, command)).size(14));
    }

    column![
        text("xgamma Not Found").size(24),
        text(missing.to_string()).size(16),
        text("Please install xgamma using one of the following commands:").size(14),
        hints,
        text("After installation, please restart the application.").size(14),
    ]
    .spacing(15)
    .into()
}

fn index(channel: Channel) -> usize {
    match channel {
        Channel::Red => 0,
        Channel::Green => 1,
        Channel::Blue => 2,
    }
}
