//! Content kinds and the pack sections that hold them

use std::fmt;

/// What a file in a pack is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentKind {
    Integration,
    Script,
    Playbook,
    TestPlaybook,
    Classifier,
    Mapper,
    IncidentField,
    IncidentType,
    IndicatorField,
    IndicatorType,
    Layout,
    LayoutContainer,
    Dashboard,
    Widget,
    Report,
    Connection,
    GenericField,
    GenericType,
    GenericModule,
    GenericDefinition,
    List,
    Job,
    Wizard,
    PreProcessRule,
    ModelingRule,
    ParsingRule,
    CorrelationRule,
    XSIAMDashboard,
    XSIAMReport,
    Trigger,
    XDRCTemplate,
    LayoutRule,
    AssetsModelingRule,
    CaseLayout,
    CaseLayoutRule,
    PackIgnore,
    SecretsIgnore,
    PackMetadata,
    ReleaseNote,
    Readme,
    Changelog,
    Image,
    Description,
    Code,
    UnitTest,
    Schema,
    SampleData,
    Other,
}

impl ContentKind {
    /// Whether this kind is a shippable content item rather than a sidecar or pack file
    pub fn is_item(self) -> bool {
        !matches!(
            self,
            ContentKind::PackIgnore
                | ContentKind::SecretsIgnore
                | ContentKind::PackMetadata
                | ContentKind::ReleaseNote
                | ContentKind::Readme
                | ContentKind::Changelog
                | ContentKind::Image
                | ContentKind::Description
                | ContentKind::Code
                | ContentKind::UnitTest
                | ContentKind::Schema
                | ContentKind::SampleData
                | ContentKind::Other
        )
    }

    /// Kinds whose unified body embeds a code sidecar
    pub fn carries_code(self) -> bool {
        matches!(self, ContentKind::Integration | ContentKind::Script)
    }

    /// Kinds of the rule family that inline `.xif` sources
    pub fn is_rule_family(self) -> bool {
        matches!(
            self,
            ContentKind::ModelingRule
                | ContentKind::ParsingRule
                | ContentKind::CorrelationRule
                | ContentKind::AssetsModelingRule
        )
    }

    /// Whether the natural id lives under `commonfields.id`
    pub fn id_under_commonfields(self) -> bool {
        matches!(self, ContentKind::Integration | ContentKind::Script)
    }

    /// Key used in the computed `contentItems` metadata section
    pub fn metadata_key(self) -> &'static str {
        match self {
            ContentKind::Integration => "integration",
            ContentKind::Script => "automation",
            ContentKind::Playbook => "playbook",
            ContentKind::TestPlaybook => "testplaybook",
            ContentKind::Classifier => "classifier",
            ContentKind::Mapper => "mapper",
            ContentKind::IncidentField => "incidentfield",
            ContentKind::IncidentType => "incidenttype",
            ContentKind::IndicatorField => "indicatorfield",
            ContentKind::IndicatorType => "reputation",
            ContentKind::Layout => "layout",
            ContentKind::LayoutContainer => "layoutscontainer",
            ContentKind::Dashboard => "dashboard",
            ContentKind::Widget => "widget",
            ContentKind::Report => "report",
            ContentKind::Connection => "connection",
            ContentKind::GenericField => "genericfield",
            ContentKind::GenericType => "generictype",
            ContentKind::GenericModule => "genericmodule",
            ContentKind::GenericDefinition => "genericdefinition",
            ContentKind::List => "list",
            ContentKind::Job => "job",
            ContentKind::Wizard => "wizard",
            ContentKind::PreProcessRule => "preprocessrule",
            ContentKind::ModelingRule => "modelingrule",
            ContentKind::ParsingRule => "parsingrule",
            ContentKind::CorrelationRule => "correlationrule",
            ContentKind::XSIAMDashboard => "xsiamdashboard",
            ContentKind::XSIAMReport => "xsiamreport",
            ContentKind::Trigger => "trigger",
            ContentKind::XDRCTemplate => "xdrctemplate",
            ContentKind::LayoutRule => "layoutrule",
            ContentKind::AssetsModelingRule => "assetsmodelingrule",
            ContentKind::CaseLayout => "caselayout",
            ContentKind::CaseLayoutRule => "caselayoutrule",
            ContentKind::PackIgnore => "packignore",
            ContentKind::SecretsIgnore => "secretsignore",
            ContentKind::PackMetadata => "metadata",
            ContentKind::ReleaseNote => "releasenote",
            ContentKind::Readme => "readme",
            ContentKind::Changelog => "changelog",
            ContentKind::Image => "image",
            ContentKind::Description => "description",
            ContentKind::Code => "code",
            ContentKind::UnitTest => "unittest",
            ContentKind::Schema => "schema",
            ContentKind::SampleData => "sampledata",
            ContentKind::Other => "other",
        }
    }

    /// Human label used in `contentDisplays`
    pub fn display_label(self) -> &'static str {
        match self {
            ContentKind::Integration => "Integration",
            ContentKind::Script => "Automation",
            ContentKind::Playbook => "Playbook",
            ContentKind::TestPlaybook => "Test Playbook",
            ContentKind::Classifier => "Classifier",
            ContentKind::Mapper => "Mapper",
            ContentKind::IncidentField => "Incident Field",
            ContentKind::IncidentType => "Incident Type",
            ContentKind::IndicatorField => "Indicator Field",
            ContentKind::IndicatorType => "Reputation",
            ContentKind::Layout | ContentKind::LayoutContainer => "Layout",
            ContentKind::Dashboard => "Dashboard",
            ContentKind::Widget => "Widget",
            ContentKind::Report => "Report",
            ContentKind::Connection => "Connection",
            ContentKind::GenericField => "Generic Field",
            ContentKind::GenericType => "Generic Type",
            ContentKind::GenericModule => "Generic Module",
            ContentKind::GenericDefinition => "Generic Definition",
            ContentKind::List => "List",
            ContentKind::Job => "Job",
            ContentKind::Wizard => "Wizard",
            ContentKind::PreProcessRule => "Pre Process Rule",
            ContentKind::ModelingRule => "Modeling Rule",
            ContentKind::ParsingRule => "Parsing Rule",
            ContentKind::CorrelationRule => "Correlation Rule",
            ContentKind::XSIAMDashboard => "XSIAM Dashboard",
            ContentKind::XSIAMReport => "XSIAM Report",
            ContentKind::Trigger => "Trigger",
            ContentKind::XDRCTemplate => "XDRC Template",
            ContentKind::LayoutRule => "Layout Rule",
            ContentKind::AssetsModelingRule => "Assets Modeling Rule",
            ContentKind::CaseLayout => "Case Layout",
            ContentKind::CaseLayoutRule => "Case Layout Rule",
            other => other.metadata_key(),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A fixed directory directly under a pack root
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Integrations,
    BetaIntegrations,
    Scripts,
    Playbooks,
    TestPlaybooks,
    IncidentTypes,
    IncidentFields,
    IndicatorFields,
    IndicatorTypes,
    Classifiers,
    Widgets,
    Layouts,
    Dashboards,
    Reports,
    Connections,
    ReleaseNotes,
    Lists,
    Wizards,
    Jobs,
    GenericFields,
    GenericTypes,
    GenericModules,
    GenericDefinitions,
    ModelingRules,
    ParsingRules,
    CorrelationRules,
    Triggers,
    XSIAMDashboards,
    XSIAMReports,
    XDRCTemplates,
    LayoutRules,
    AssetsModelingRules,
    CaseLayoutRules,
    CaseLayouts,
    PreProcessRules,
    DocFiles,
}

impl Section {
    /// Every section in upload order: the declaration order above
    pub const UPLOAD_ORDER: [Section; 36] = [
        Section::Integrations,
        Section::BetaIntegrations,
        Section::Scripts,
        Section::Playbooks,
        Section::TestPlaybooks,
        Section::IncidentTypes,
        Section::IncidentFields,
        Section::IndicatorFields,
        Section::IndicatorTypes,
        Section::Classifiers,
        Section::Widgets,
        Section::Layouts,
        Section::Dashboards,
        Section::Reports,
        Section::Connections,
        Section::ReleaseNotes,
        Section::Lists,
        Section::Wizards,
        Section::Jobs,
        Section::GenericFields,
        Section::GenericTypes,
        Section::GenericModules,
        Section::GenericDefinitions,
        Section::ModelingRules,
        Section::ParsingRules,
        Section::CorrelationRules,
        Section::Triggers,
        Section::XSIAMDashboards,
        Section::XSIAMReports,
        Section::XDRCTemplates,
        Section::LayoutRules,
        Section::AssetsModelingRules,
        Section::CaseLayoutRules,
        Section::CaseLayouts,
        Section::PreProcessRules,
        Section::DocFiles,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Section::Integrations => "Integrations",
            Section::BetaIntegrations => "BetaIntegrations",
            Section::Scripts => "Scripts",
            Section::Playbooks => "Playbooks",
            Section::TestPlaybooks => "TestPlaybooks",
            Section::IncidentTypes => "IncidentTypes",
            Section::IncidentFields => "IncidentFields",
            Section::IndicatorFields => "IndicatorFields",
            Section::IndicatorTypes => "IndicatorTypes",
            Section::Classifiers => "Classifiers",
            Section::Widgets => "Widgets",
            Section::Layouts => "Layouts",
            Section::Dashboards => "Dashboards",
            Section::Reports => "Reports",
            Section::Connections => "Connections",
            Section::ReleaseNotes => "ReleaseNotes",
            Section::Lists => "Lists",
            Section::Wizards => "Wizards",
            Section::Jobs => "Jobs",
            Section::GenericFields => "GenericFields",
            Section::GenericTypes => "GenericTypes",
            Section::GenericModules => "GenericModules",
            Section::GenericDefinitions => "GenericDefinitions",
            Section::ModelingRules => "ModelingRules",
            Section::ParsingRules => "ParsingRules",
            Section::CorrelationRules => "CorrelationRules",
            Section::Triggers => "Triggers",
            Section::XSIAMDashboards => "XSIAMDashboards",
            Section::XSIAMReports => "XSIAMReports",
            Section::XDRCTemplates => "XDRCTemplates",
            Section::LayoutRules => "LayoutRules",
            Section::AssetsModelingRules => "AssetsModelingRules",
            Section::CaseLayoutRules => "CaseLayoutRules",
            Section::CaseLayouts => "CaseLayouts",
            Section::PreProcessRules => "PreProcessRules",
            Section::DocFiles => "doc_files",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Section> {
        Section::UPLOAD_ORDER
            .iter()
            .copied()
            .find(|s| s.dir_name() == name)
    }

    /// Position in the upload order
    pub fn upload_rank(self) -> usize {
        Section::UPLOAD_ORDER
            .iter()
            .position(|s| *s == self)
            .unwrap_or(usize::MAX)
    }

    /// Kind assumed for item files in this section before contents refine it
    pub fn candidate_kind(self) -> ContentKind {
        match self {
            Section::Integrations | Section::BetaIntegrations => ContentKind::Integration,
            Section::Scripts => ContentKind::Script,
            Section::Playbooks => ContentKind::Playbook,
            Section::TestPlaybooks => ContentKind::TestPlaybook,
            Section::IncidentTypes => ContentKind::IncidentType,
            Section::IncidentFields => ContentKind::IncidentField,
            Section::IndicatorFields => ContentKind::IndicatorField,
            Section::IndicatorTypes => ContentKind::IndicatorType,
            Section::Classifiers => ContentKind::Classifier,
            Section::Widgets => ContentKind::Widget,
            Section::Layouts => ContentKind::Layout,
            Section::Dashboards => ContentKind::Dashboard,
            Section::Reports => ContentKind::Report,
            Section::Connections => ContentKind::Connection,
            Section::ReleaseNotes => ContentKind::ReleaseNote,
            Section::Lists => ContentKind::List,
            Section::Wizards => ContentKind::Wizard,
            Section::Jobs => ContentKind::Job,
            Section::GenericFields => ContentKind::GenericField,
            Section::GenericTypes => ContentKind::GenericType,
            Section::GenericModules => ContentKind::GenericModule,
            Section::GenericDefinitions => ContentKind::GenericDefinition,
            Section::ModelingRules => ContentKind::ModelingRule,
            Section::ParsingRules => ContentKind::ParsingRule,
            Section::CorrelationRules => ContentKind::CorrelationRule,
            Section::Triggers => ContentKind::Trigger,
            Section::XSIAMDashboards => ContentKind::XSIAMDashboard,
            Section::XSIAMReports => ContentKind::XSIAMReport,
            Section::XDRCTemplates => ContentKind::XDRCTemplate,
            Section::LayoutRules => ContentKind::LayoutRule,
            Section::AssetsModelingRules => ContentKind::AssetsModelingRule,
            Section::CaseLayoutRules => ContentKind::CaseLayoutRule,
            Section::CaseLayouts => ContentKind::CaseLayout,
            Section::PreProcessRules => ContentKind::PreProcessRule,
            Section::DocFiles => ContentKind::Image,
        }
    }

    /// Sections whose items may sit directly in the section folder
    pub fn allows_depth_one_files(self) -> bool {
        !matches!(
            self,
            Section::Integrations
                | Section::BetaIntegrations
                | Section::Scripts
                | Section::GenericFields
                | Section::AssetsModelingRules
                | Section::XDRCTemplates
        )
    }

    /// Sections whose item directories hold code that gets unified
    pub fn holds_code(self) -> bool {
        matches!(
            self,
            Section::Integrations | Section::BetaIntegrations | Section::Scripts
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_round_trip() {
        for section in Section::UPLOAD_ORDER {
            assert_eq!(Section::from_dir_name(section.dir_name()), Some(section));
        }
        assert_eq!(Section::from_dir_name("Nope"), None);
    }

    #[test]
    fn test_upload_order_prefix() {
        let expected = [
            "Integrations",
            "BetaIntegrations",
            "Scripts",
            "Playbooks",
            "TestPlaybooks",
            "IncidentTypes",
            "IncidentFields",
            "IndicatorFields",
            "IndicatorTypes",
            "Classifiers",
            "Widgets",
            "Layouts",
            "Dashboards",
        ];
        let names: Vec<_> = Section::UPLOAD_ORDER[..expected.len()]
            .iter()
            .map(|s| s.dir_name())
            .collect();
        assert_eq!(names, expected);
        assert!(Section::Integrations.upload_rank() < Section::Scripts.upload_rank());
    }

    #[test]
    fn test_depth_one_sections() {
        assert!(Section::Playbooks.allows_depth_one_files());
        assert!(Section::IncidentFields.allows_depth_one_files());
        assert!(!Section::Integrations.allows_depth_one_files());
        assert!(!Section::Scripts.allows_depth_one_files());
    }

    #[test]
    fn test_kind_predicates() {
        assert!(ContentKind::Integration.is_item());
        assert!(!ContentKind::Readme.is_item());
        assert!(ContentKind::Script.carries_code());
        assert!(ContentKind::ParsingRule.is_rule_family());
        assert_eq!(ContentKind::Script.metadata_key(), "automation");
    }

    #[test]
    fn test_case_layout_rules_are_their_own_kind() {
        assert_eq!(Section::CaseLayoutRules.candidate_kind(), ContentKind::CaseLayoutRule);
        assert_eq!(Section::LayoutRules.candidate_kind(), ContentKind::LayoutRule);
        assert_eq!(ContentKind::CaseLayoutRule.metadata_key(), "caselayoutrule");
        assert_eq!(ContentKind::CaseLayoutRule.display_label(), "Case Layout Rule");
        assert!(ContentKind::CaseLayoutRule.is_item());
    }
}
