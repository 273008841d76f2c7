// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::bbox::BoundingBox;
use crate::config::SubnetConfig;
use crate::document::{NetDocument, RouteDocument};
use crate::errors::{EntityClass, FormatError, SubnetError};
use crate::pipeline::{prune_network, run};

// A(6000,6000) and the corner junction C(5000,5000) lie inside the default
// box, B(9000,6000) lies outside.
const NET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>

<net version="1.9" junctionCornerDetail="5" limitTurnSpeed="5.50">

    <location netOffset="0.00,0.00" convBoundary="5000.00,5000.00,9000.00,6000.00" origBoundary="5000.00,5000.00,9000.00,6000.00" projParameter="!"/>

    <edge id=":A_0" function="internal">
        <lane id=":A_0_0" index="0" speed="6.51" length="4.82" shape="5998.40,5995.20 5995.20,5998.40"/>
    </edge>
    <edge id=":A_1" function="internal">
        <lane id=":A_1_0" index="0" speed="6.51" length="4.82" shape="5995.20,5998.40 5998.40,5995.20"/>
    </edge>
    <edge id="AB" from="A" to="B" priority="-1">
        <lane id="AB_0" index="0" speed="13.89" length="2995.20" shape="6004.80,5998.40 9000.00,5998.40"/>
    </edge>
    <edge id="AC" from="A" to="C" priority="-1">
        <lane id="AC_0" index="0" speed="13.89" length="1407.00" shape="5995.20,5998.40 5000.00,5000.00"/>
    </edge>
    <edge id="BA" from="B" to="A" priority="-1">
        <lane id="BA_0" index="0" speed="13.89" length="2995.20" shape="9000.00,6001.60 6004.80,6001.60"/>
    </edge>
    <edge id="CA" from="C" to="A" priority="-1">
        <lane id="CA_0" index="0" speed="13.89" length="1407.00" shape="5000.00,5000.00 5998.40,5995.20"/>
    </edge>

    <tlLogic id="A" type="static" programID="0" offset="0">
        <phase duration="42" state="GGG"/>
        <phase duration="3"  state="yyy"/>
    </tlLogic>
    <tlLogic id="B" type="static" programID="0" offset="0">
        <phase duration="42" state="G"/>
        <phase duration="3"  state="y"/>
    </tlLogic>

    <junction id="A" type="traffic_light" x="6000.00" y="6000.00" incLanes="BA_0 CA_0" intLanes=":A_0_0 :A_1_0" shape="6006.40,6006.40 5993.60,5993.60">
        <request index="0" response="000" foes="000" cont="0"/>
        <request index="1" response="000" foes="000" cont="0"/>
        <request index="2" response="000" foes="000" cont="0"/>
    </junction>
    <junction id="B" type="traffic_light" x="9000.00" y="6000.00" incLanes="AB_0" intLanes="" shape="9000.00,6003.20 9000.00,5996.80"/>
    <junction id="C" type="dead_end" x="5000.00" y="5000.00" incLanes="AC_0" intLanes="" shape="5001.13,4998.87 4998.87,5001.13"/>

    <connection from="BA" to="AC" fromLane="0" toLane="0" via=":A_0_0" tl="A" linkIndex="0" dir="l" state="O"/>
    <connection from="CA" to="AC" fromLane="0" toLane="0" via=":A_1_0" tl="A" linkIndex="1" dir="t" state="O"/>
    <connection from="CA" to="AB" fromLane="0" toLane="0" tl="A" linkIndex="2" dir="r" state="O"/>

    <connection from=":A_0" to="AC" fromLane="0" toLane="0" dir="l" state="M"/>
    <connection from=":A_1" to="AC" fromLane="0" toLane="0" dir="t" state="M"/>

</net>
"#;

const PRUNED_NET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>

<net version="1.9" junctionCornerDetail="5" limitTurnSpeed="5.50">

    <location netOffset="0.00,0.00" convBoundary="5000.00,5000.00,9000.00,6000.00" origBoundary="5000.00,5000.00,9000.00,6000.00" projParameter="!"/>

    <edge id=":A_0" function="internal">
        <lane id=":A_0_0" index="0" speed="6.51" length="4.82" shape="5998.40,5995.20 5995.20,5998.40"/>
    </edge>
    <edge id=":A_1" function="internal">
        <lane id=":A_1_0" index="0" speed="6.51" length="4.82" shape="5995.20,5998.40 5998.40,5995.20"/>
    </edge>
    <edge id="AC" from="A" to="C" priority="-1">
        <lane id="AC_0" index="0" speed="13.89" length="1407.00" shape="5995.20,5998.40 5000.00,5000.00"/>
    </edge>
    <edge id="CA" from="C" to="A" priority="-1">
        <lane id="CA_0" index="0" speed="13.89" length="1407.00" shape="5000.00,5000.00 5998.40,5995.20"/>
    </edge>

    <tlLogic id="A" type="static" programID="0" offset="0">
        <phase duration="42" state="GGG"/>
        <phase duration="3"  state="yyy"/>
    </tlLogic>

    <junction id="A" type="traffic_light" x="6000.00" y="6000.00" incLanes="BA_0 CA_0" intLanes=":A_0_0 :A_1_0" shape="6006.40,6006.40 5993.60,5993.60">
        <request index="0" response="000" foes="000" cont="0"/>
        <request index="1" response="000" foes="000" cont="0"/>
        <request index="2" response="000" foes="000" cont="0"/>
    </junction>
    <junction id="C" type="dead_end" x="5000.00" y="5000.00" incLanes="AC_0" intLanes="" shape="5001.13,4998.87 4998.87,5001.13"/>

    <connection from="CA" to="AC" fromLane="0" toLane="0" via=":A_1_0" tl="A" linkIndex="1" dir="t" state="O"/>

    <connection from=":A_0" to="AC" fromLane="0" toLane="0" dir="l" state="M"/>
    <connection from=":A_1" to="AC" fromLane="0" toLane="0" dir="t" state="M"/>

</net>
"#;

const ROUTES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>

<routes xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="http://sumo.dlr.de/xsd/routes_file.xsd">
    <vType id="passenger" vClass="passenger"/>
    <route id="loop" edges="CA AC"/>
    <route id="east" edges="CA AB BA AC"/>
    <vehicle id="v0" type="passenger" depart="0.00" route="loop"/>
    <vehicle id="v1" type="passenger" depart="5.00" route="east"/>
    <vehicle id="v2" type="passenger" depart="10.00">
        <route edges="CA AB"/>
    </vehicle>
    <vehicle id="v3" type="passenger" depart="15.00">
        <route edges="CA AC"/>
    </vehicle>
</routes>
"#;

const FILTERED_ROUTES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>

<routes xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="http://sumo.dlr.de/xsd/routes_file.xsd">
    <vType id="passenger" vClass="passenger"/>
    <route id="loop" edges="CA AC"/>
    <vehicle id="v0" type="passenger" depart="0.00" route="loop"/>
    <vehicle id="v3" type="passenger" depart="15.00">
        <route edges="CA AC"/>
    </vehicle>
</routes>
"#;

fn covering_config() -> SubnetConfig {
    SubnetConfig {
        bbox: BoundingBox {
            xmin: 0.0,
            xmax: 10000.0,
            ymin: 0.0,
            ymax: 10000.0,
        },
        ..SubnetConfig::default()
    }
}

#[test]
fn extracts_the_subnetwork_inside_the_box() {
    let output = run(&SubnetConfig::default(), NET, &[ROUTES]).unwrap();

    assert_eq!(output.net.xml, PRUNED_NET);
    assert_eq!(output.routes.len(), 1);
    assert_eq!(output.routes[0].xml, FILTERED_ROUTES);
    assert!(output.warnings.is_empty());

    let plan = &output.net.plan;
    assert!(plan.junctions.keep.contains("A"));
    assert!(plan.junctions.remove.contains("B"));
    assert!(plan.edges.remove.contains("AB"));
    assert!(plan.edges.remove.contains("BA"));
}

#[test]
fn corner_junction_is_kept() {
    let output = prune_network(&SubnetConfig::default(), NET).unwrap();
    assert!(output.plan.junctions.keep.contains("C"));
    assert!(output.xml.contains("<junction id=\"C\""));
}

#[test]
fn unreferenced_traffic_light_at_removed_junction_is_dropped() {
    let output = prune_network(&SubnetConfig::default(), NET).unwrap();

    assert!(!output.xml.contains("<tlLogic id=\"B\""));
    assert!(output.xml.contains("<tlLogic id=\"A\""));
    assert_eq!(output.report.removed(EntityClass::TrafficLight).nested, 1);
}

#[test]
fn lane_of_kept_junction_on_removed_edge_is_removed() {
    let output = prune_network(&SubnetConfig::default(), NET).unwrap();
    let lanes = &output.plan.lanes;

    // A lists BA_0 as incoming, but BA starts at B
    assert!(lanes.remove.contains("BA_0"));
    assert!(!lanes.keep.contains("BA_0"));
    assert!(lanes.keep.contains("CA_0"));
}

#[test]
fn keep_and_remove_sets_are_disjoint() {
    let output = prune_network(&SubnetConfig::default(), NET).unwrap();
    output.plan.check_disjoint().unwrap();

    let covering = prune_network(&covering_config(), NET).unwrap();
    covering.plan.check_disjoint().unwrap();
}

#[test]
fn survivors_reference_only_survivors() {
    let output = run(&SubnetConfig::default(), NET, &[ROUTES]).unwrap();
    let plan = &output.net.plan;

    let net = NetDocument::parse(&output.net.xml).unwrap();
    for record in &net.connections {
        let connection = &record.data;
        assert!(plan.edges.keep.contains(&connection.from));
        assert!(plan.edges.keep.contains(&connection.to));
        for lane in connection.lane_ids() {
            assert!(plan.lanes.keep.contains(&lane), "{} survived", lane);
        }
    }
    for record in &net.edges {
        for lane in &record.data.lanes {
            assert!(plan.lanes.keep.contains(lane));
        }
    }

    let routes = RouteDocument::parse(&output.routes[0].xml).unwrap();
    for record in &routes.entries {
        for edge in &record.data.edges {
            assert!(plan.edges.keep.contains(edge), "{} survived", edge);
        }
    }
}

#[test]
fn covering_box_changes_nothing() {
    let output = run(&covering_config(), NET, &[ROUTES]).unwrap();

    assert_eq!(output.net.xml, NET);
    assert_eq!(output.routes[0].xml, ROUTES);
    assert!(output.net.report.counts.is_empty());
    assert!(output.routes[0].report.counts.is_empty());
}

#[test]
fn repeated_runs_are_identical() {
    let config = SubnetConfig {
        verbose_removal_logging: true,
        ..SubnetConfig::default()
    };
    let first = run(&config, NET, &[ROUTES, FILTERED_ROUTES]).unwrap();
    let second = run(&config, NET, &[ROUTES, FILTERED_ROUTES]).unwrap();

    assert_eq!(first.net.xml, second.net.xml);
    assert_eq!(first.routes[0].xml, second.routes[0].xml);
    assert_eq!(first.routes[1].xml, second.routes[1].xml);
    assert_eq!(first.net.report, second.net.report);
}

#[test]
fn refiltering_the_output_is_a_no_op() {
    let config = SubnetConfig::default();
    let first = run(&config, NET, &[ROUTES]).unwrap();
    let second = run(&config, &first.net.xml, &[first.routes[0].xml.as_str()]).unwrap();

    assert_eq!(second.net.xml, first.net.xml);
    assert_eq!(second.routes[0].xml, first.routes[0].xml);
}

#[test]
fn relaxed_checks_give_the_same_output() {
    let relaxed = SubnetConfig {
        strict_format_checks: false,
        ..SubnetConfig::default()
    };
    let output = run(&relaxed, NET, &[ROUTES]).unwrap();

    assert_eq!(output.net.xml, PRUNED_NET);
    assert_eq!(output.routes[0].xml, FILTERED_ROUTES);
}

#[test]
fn format_errors_abort_the_run() {
    let broken = NET.replace(r#"<junction id="C" type="dead_end" x="5000.00""#, r#"<junction id="C" type="dead_end""#);

    match run(&SubnetConfig::default(), &broken, &[ROUTES]) {
        Err(SubnetError::Format(FormatError::MissingAttribute {
            element: "junction",
            attribute: "x",
            ..
        })) => {}
        other => panic!("expected a format error, got {:?}", other.map(|o| o.net.xml)),
    }

    let bad_routes = "<routes><vehicle depart=\"0\"/></routes>";
    assert!(matches!(
        run(&SubnetConfig::default(), NET, &[ROUTES, bad_routes]),
        Err(SubnetError::Format(_))
    ));
}

#[test]
fn invalid_box_is_rejected_before_parsing() {
    let config = SubnetConfig {
        bbox: BoundingBox {
            xmin: 8000.0,
            xmax: 5000.0,
            ymin: 5000.0,
            ymax: 8000.0,
        },
        ..SubnetConfig::default()
    };

    assert!(matches!(
        run(&config, "not xml at all", &[]),
        Err(SubnetError::Config(_))
    ));
}
