mod tests {
    use myrtio_matrix_spi::Error;
    use myrtio_matrix_spi::topology::{MAX_PANELS, PanelTransform, PixelMap, Topology};

    fn two_panels(second: PanelTransform) -> Topology {
        Topology::new(13, 9, &[PanelTransform::Identity, second]).unwrap()
    }

    #[test]
    fn test_reference_dimensions() {
        let topology = Topology::default();
        assert_eq!(topology.width(), 26);
        assert_eq!(topology.height(), 9);
        assert_eq!(topology.panel_led_count(), 117);
        assert_eq!(topology.led_count(), 234);
    }

    #[test]
    fn test_serpentine_within_panel() {
        let topology = Topology::default();
        assert_eq!(topology.physical_index(0, 0), Some(0));
        assert_eq!(topology.physical_index(12, 0), Some(12));
        assert_eq!(topology.physical_index(12, 1), Some(13));
        assert_eq!(topology.physical_index(0, 1), Some(25));
        assert_eq!(topology.physical_index(0, 8), Some(104));
    }

    #[test]
    fn test_serpentine_row_direction() {
        let topology = Topology::default();
        for panel in 0..topology.panel_count() {
            let base = panel * topology.panel_width();
            let row = |y: usize| -> Vec<usize> {
                (0..topology.panel_width())
                    .map(|x| topology.physical_index(base + x, y).unwrap())
                    .collect()
            };

            let even = row(0);
            assert!(
                even.windows(2).all(|w| w[0] < w[1]),
                "panel {panel} row 0: {even:?}"
            );
            let odd = row(1);
            assert!(
                odd.windows(2).all(|w| w[0] > w[1]),
                "panel {panel} row 1: {odd:?}"
            );
            assert_eq!(even[0], panel * topology.panel_led_count());
        }
    }

    #[test]
    fn test_second_panel_offset() {
        let topology = Topology::default();
        assert_eq!(topology.physical_index(13, 0), Some(117));
        assert_eq!(topology.physical_index(25, 8), Some(233));
    }

    #[test]
    fn test_out_of_range() {
        let topology = Topology::default();
        assert_eq!(topology.physical_index(26, 0), None);
        assert_eq!(topology.physical_index(0, 9), None);
    }

    #[test]
    fn test_mirror_and_rotate() {
        let mirrored = two_panels(PanelTransform::MirrorX);
        assert_eq!(mirrored.physical_index(13, 0), Some(129));
        assert_eq!(mirrored.physical_index(25, 0), Some(117));

        let rotated = two_panels(PanelTransform::Rotate180);
        assert_eq!(rotated.physical_index(13, 0), Some(233));
        assert_eq!(rotated.physical_index(25, 8), Some(117));
    }

    #[test]
    fn test_every_transform_is_a_bijection() {
        for transform in [
            PanelTransform::Identity,
            PanelTransform::MirrorX,
            PanelTransform::Rotate180,
        ] {
            let topology = two_panels(transform);
            topology.validate().unwrap();

            let mut indices: Vec<usize> = (0..topology.height())
                .flat_map(|y| (0..topology.width()).map(move |x| (x, y)))
                .map(|(x, y)| topology.physical_index(x, y).unwrap())
                .collect();
            indices.sort_unstable();
            assert_eq!(indices, (0..234).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_first_panel_must_be_identity() {
        let result = Topology::new(13, 9, &[PanelTransform::MirrorX, PanelTransform::Identity]);
        assert!(matches!(result, Err(Error::Topology { .. })));
    }

    #[test]
    fn test_rejects_degenerate_parameters() {
        assert!(Topology::new(0, 9, &[PanelTransform::Identity]).is_err());
        assert!(Topology::new(13, 0, &[PanelTransform::Identity]).is_err());
        assert!(Topology::new(13, 9, &[]).is_err());
        assert!(Topology::new(13, 9, &[PanelTransform::Identity; MAX_PANELS + 1]).is_err());
        assert!(Topology::new(13, 9, &[PanelTransform::Identity; MAX_PANELS]).is_ok());
    }

    #[test]
    fn test_rejects_overflowing_led_count() {
        for (width, height, panels) in [
            (usize::MAX / 2, 9, 2),
            (usize::MAX / 2, 9, 1),
            (13, usize::MAX, 1),
            (usize::MAX, usize::MAX, MAX_PANELS),
            (256, 256, 1),
        ] {
            let result = Topology::new(width, height, &vec![PanelTransform::Identity; panels]);
            assert!(
                matches!(result, Err(Error::Topology { .. })),
                "{width}x{height} x{panels}"
            );
        }
    }

    #[test]
    fn test_trailing_transform() {
        let topology = Topology::default().with_trailing_transform(PanelTransform::Rotate180);
        assert_eq!(
            topology.panels(),
            &[PanelTransform::Identity, PanelTransform::Rotate180]
        );
    }

    #[test]
    fn test_transform_names() {
        for transform in [
            PanelTransform::Identity,
            PanelTransform::MirrorX,
            PanelTransform::Rotate180,
        ] {
            assert_eq!(PanelTransform::parse_from_str(transform.as_str()), Some(transform));
        }
        assert_eq!(PanelTransform::parse_from_str("rotate-90"), None);
    }

    #[test]
    fn test_pixel_map_flips_rows() {
        let topology = Topology::default();
        let flipped = PixelMap::new(&topology, true).unwrap();
        assert_eq!(flipped.len(), 234);
        assert_eq!(flipped.get(0, 0), Some(104));
        assert_eq!(flipped.get(0, 8), Some(0));
        assert_eq!(flipped.get(26, 0), None);

        let straight = PixelMap::new(&topology, false).unwrap();
        assert_eq!(straight.get(0, 0), Some(0));
        assert_eq!(straight.get(25, 8), Some(233));
    }

    #[test]
    fn test_pixel_map_is_a_permutation() {
        let map = PixelMap::new(&two_panels(PanelTransform::MirrorX), true).unwrap();
        let mut indices: Vec<u16> = map.as_slice().to_vec();
        indices.sort_unstable();
        assert_eq!(indices, (0..234).collect::<Vec<u16>>());
    }
}
